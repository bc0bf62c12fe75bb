//! Batch export of rare moderate-impact variant calls for a set of
//! individuals in one project, written as a gzipped TSV.
//!
//! The individual-id list is validated against the project roster before the
//! output file is created, so a bad list never leaves a truncated or empty
//! artifact behind.

pub mod filter;
pub mod model;
pub mod stores;

use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::filter::{QualityFilter, VariantFilter};
use crate::model::{ExportRow, ProjectData};
use crate::stores::{PopulationStore, Reference, VariantStore};

pub const HEADER_FIELDS: &[&str] = &[
    "project_id",
    "family_id",
    "individual_id",
    "gene",
    "chrom",
    "pos",
    "ref",
    "alt",
    "rsid",
    "annotation",
    "exac_af",
    "1kg_af",
    "exac_popmax_af",
    "merck_wgs_3793_af",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("{file}: {} out of {total} ids are invalid. The invalid ids are: {}", invalid.len(), invalid.join(", "))]
    InvalidIndividualIds {
        file: String,
        invalid: Vec<String>,
        total: usize,
    },

    #[error("failed to load data: {0}")]
    DataLoad(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Parse an individual-id list: one id per line, blank lines and `#` comments
/// skipped, only the first tab-separated field kept.
pub fn read_individual_ids(path: &Path) -> Result<Vec<String>, ExportError> {
    let file = File::open(path)?;
    let mut ids = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let id = line.split('\t').next().unwrap_or_default();
        ids.push(id.to_string());
    }
    Ok(ids)
}

pub struct ExportJob<'a> {
    pub project: &'a ProjectData,
    pub variants: &'a dyn VariantStore,
    pub reference: &'a dyn Reference,
    pub populations: &'a dyn PopulationStore,
    pub variant_filter: VariantFilter,
    pub quality_filter: QualityFilter,
}

impl<'a> ExportJob<'a> {
    pub fn new(
        project: &'a ProjectData,
        variants: &'a dyn VariantStore,
        reference: &'a dyn Reference,
        populations: &'a dyn PopulationStore,
    ) -> Self {
        Self {
            project,
            variants,
            reference,
            populations,
            variant_filter: VariantFilter::moderate_impact(),
            quality_filter: QualityFilter::default(),
        }
    }

    /// Check every requested id against the project roster. All invalid ids
    /// are reported at once.
    pub fn validate_individuals(
        &self,
        ids: &[String],
        individuals_file: &str,
    ) -> Result<HashSet<String>, ExportError> {
        let roster: HashSet<&str> = self.project.individual_ids().into_iter().collect();
        let invalid: Vec<String> = ids
            .iter()
            .filter(|id| !roster.contains(id.as_str()))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(ExportError::InvalidIndividualIds {
                file: individuals_file.to_string(),
                invalid,
                total: roster.len(),
            });
        }
        Ok(ids.iter().cloned().collect())
    }

    /// Rows in family order, then individual order within the family, then
    /// the store's emission order for the variants themselves.
    pub fn collect_rows(&self, of_interest: &HashSet<String>) -> Result<Vec<ExportRow>, ExportError> {
        let mut rows = Vec::new();
        for family in &self.project.families {
            let variants = self.variants.variants_for_family(&family.family_id)?;
            for individual_id in &family.individuals {
                if !of_interest.contains(individual_id) {
                    continue;
                }
                for variant in &variants {
                    let Some(genotype) = variant.genotypes.get(individual_id) else {
                        continue;
                    };
                    if genotype.num_alt == 0
                        || !self.quality_filter.passes(genotype)
                        || !self.variant_filter.passes(variant)
                    {
                        continue;
                    }

                    let gene_id = variant.worst_gene_id().unwrap_or_default();
                    let gene = self
                        .reference
                        .gene_symbol(gene_id)
                        .unwrap_or_else(|| gene_id.to_string());
                    let custom = self.populations.frequencies(
                        &variant.chrom,
                        variant.pos,
                        &variant.ref_allele,
                        &variant.alt,
                    );

                    rows.push(ExportRow {
                        project_id: self.project.project_id.clone(),
                        family_id: family.family_id.clone(),
                        individual_id: individual_id.clone(),
                        gene,
                        chrom: variant.chrom.clone(),
                        pos: variant.pos,
                        ref_allele: variant.ref_allele.clone(),
                        alt: variant.alt.clone(),
                        rsid: variant.rsid.clone(),
                        annotation: variant.annotation.group.clone(),
                        exac_af: variant.annotation.freqs.get("exac").copied().unwrap_or(0.0),
                        g1k_af: variant
                            .annotation
                            .freqs
                            .get("g1k_all")
                            .copied()
                            .unwrap_or(0.0),
                        exac_popmax_af: custom.get("exac-popmax").copied().unwrap_or(0.0),
                        merck_wgs_3793_af: custom.get("merck-wgs-3793").copied().unwrap_or(0.0),
                    });
                }
            }
        }
        Ok(rows)
    }

    /// Run the whole export. Validation happens before the output file is
    /// opened.
    pub fn run(&self, individuals_file: &Path, output_dir: &Path) -> Result<PathBuf, ExportError> {
        let ids = read_individual_ids(individuals_file)?;
        let of_interest =
            self.validate_individuals(&ids, &individuals_file.display().to_string())?;
        tracing::info!(
            project = %self.project.project_id,
            individuals = of_interest.len(),
            "Starting variant export"
        );

        let rows = self.collect_rows(&of_interest)?;

        let output_path =
            output_dir.join(format!("individuals_in_{}.tsv.gz", self.project.project_id));
        write_tsv_gz(&output_path, &rows)?;

        tracing::info!(
            rows = rows.len(),
            output = %output_path.display(),
            "Export complete"
        );
        Ok(output_path)
    }
}

fn write_tsv_gz(path: &Path, rows: &[ExportRow]) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut encoder = GzEncoder::new(file, Compression::default());

    writeln!(encoder, "{}", HEADER_FIELDS.join("\t"))?;
    for row in rows {
        writeln!(encoder, "{}", row.fields().join("\t"))?;
    }
    encoder.finish()?;
    Ok(())
}
