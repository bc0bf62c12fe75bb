//! Data-source traits for the export pipeline.
//!
//! The variant store, reference and custom population store are external
//! systems in the real deployment. The pipeline only needs these three
//! lookups, so each is a trait with a JSON-file-backed implementation for
//! local runs and tests.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::model::Variant;
use crate::ExportError;

pub trait VariantStore {
    /// All variant calls recorded for a family, unfiltered.
    fn variants_for_family(&self, family_id: &str) -> Result<Vec<Variant>, ExportError>;
}

pub trait Reference {
    fn gene_symbol(&self, gene_id: &str) -> Option<String>;
}

pub trait PopulationStore {
    /// Custom population frequencies for a locus, keyed by population slug.
    fn frequencies(
        &self,
        chrom: &str,
        pos: u64,
        ref_allele: &str,
        alt: &str,
    ) -> HashMap<String, f64>;
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ExportError> {
    let file = File::open(path)
        .map_err(|e| ExportError::DataLoad(format!("{}: {}", path.display(), e)))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| ExportError::DataLoad(format!("{}: {}", path.display(), e)))
}

#[derive(Debug, Default)]
pub struct JsonVariantStore {
    by_family: HashMap<String, Vec<Variant>>,
}

impl JsonVariantStore {
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        Ok(Self {
            by_family: read_json(path)?,
        })
    }

    pub fn insert(&mut self, family_id: &str, variant: Variant) {
        self.by_family
            .entry(family_id.to_string())
            .or_default()
            .push(variant);
    }
}

impl VariantStore for JsonVariantStore {
    fn variants_for_family(&self, family_id: &str) -> Result<Vec<Variant>, ExportError> {
        Ok(self.by_family.get(family_id).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct JsonReference {
    symbols: HashMap<String, String>,
}

impl JsonReference {
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        Ok(Self {
            symbols: read_json(path)?,
        })
    }

    pub fn insert(&mut self, gene_id: &str, symbol: &str) {
        self.symbols.insert(gene_id.to_string(), symbol.to_string());
    }
}

impl Reference for JsonReference {
    fn gene_symbol(&self, gene_id: &str) -> Option<String> {
        self.symbols.get(gene_id).cloned()
    }
}

/// Frequencies keyed by `chrom:pos:ref:alt`.
#[derive(Debug, Default)]
pub struct JsonPopulationStore {
    by_locus: HashMap<String, HashMap<String, f64>>,
}

impl JsonPopulationStore {
    pub fn load(path: &Path) -> Result<Self, ExportError> {
        Ok(Self {
            by_locus: read_json(path)?,
        })
    }

    pub fn insert(&mut self, locus: &str, population: &str, freq: f64) {
        self.by_locus
            .entry(locus.to_string())
            .or_default()
            .insert(population.to_string(), freq);
    }
}

impl PopulationStore for JsonPopulationStore {
    fn frequencies(
        &self,
        chrom: &str,
        pos: u64,
        ref_allele: &str,
        alt: &str,
    ) -> HashMap<String, f64> {
        let key = format!("{}:{}:{}:{}", chrom, pos, ref_allele, alt);
        self.by_locus.get(&key).cloned().unwrap_or_default()
    }
}
