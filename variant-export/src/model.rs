//! Variant and project records consumed by the export pipeline.

use serde::Deserialize;
use std::collections::HashMap;

/// One transcript-level annotation. The worst one (by consequence severity)
/// is indexed from [`Annotation::worst_annotation_index`].
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptAnnotation {
    pub gene_id: String,
    pub consequence: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    /// Consequence class the variant falls into, e.g. "missense".
    pub group: String,
    pub transcripts: Vec<TranscriptAnnotation>,
    pub worst_annotation_index: usize,
    /// Reference-population allele frequencies keyed by population slug.
    #[serde(default)]
    pub freqs: HashMap<String, f64>,
}

/// A single individual's call on a variant.
#[derive(Debug, Clone, Deserialize)]
pub struct Genotype {
    /// Genotype quality; a call without one never passes the quality floor.
    pub gq: Option<f64>,
    /// Allele balance as a percentage, only meaningful for het calls.
    pub ab: Option<f64>,
    pub filter: String,
    pub num_alt: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variant {
    pub chrom: String,
    pub pos: u64,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    pub alt: String,
    #[serde(default)]
    pub rsid: String,
    pub annotation: Annotation,
    /// Calls keyed by individual id.
    pub genotypes: HashMap<String, Genotype>,
}

impl Variant {
    /// Gene id of the worst-consequence transcript, when the index is valid.
    pub fn worst_gene_id(&self) -> Option<&str> {
        self.annotation
            .transcripts
            .get(self.annotation.worst_annotation_index)
            .map(|t| t.gene_id.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Family {
    pub family_id: String,
    pub individuals: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectData {
    pub project_id: String,
    pub families: Vec<Family>,
}

impl ProjectData {
    pub fn individual_ids(&self) -> Vec<&str> {
        self.families
            .iter()
            .flat_map(|f| f.individuals.iter().map(String::as_str))
            .collect()
    }
}

/// One output line: a variant call for one individual, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub project_id: String,
    pub family_id: String,
    pub individual_id: String,
    pub gene: String,
    pub chrom: String,
    pub pos: u64,
    pub ref_allele: String,
    pub alt: String,
    pub rsid: String,
    pub annotation: String,
    pub exac_af: f64,
    pub g1k_af: f64,
    pub exac_popmax_af: f64,
    pub merck_wgs_3793_af: f64,
}

impl ExportRow {
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.project_id.clone(),
            self.family_id.clone(),
            self.individual_id.clone(),
            self.gene.clone(),
            self.chrom.clone(),
            self.pos.to_string(),
            self.ref_allele.clone(),
            self.alt.clone(),
            self.rsid.clone(),
            self.annotation.clone(),
            self.exac_af.to_string(),
            self.g1k_af.to_string(),
            self.exac_popmax_af.to_string(),
            self.merck_wgs_3793_af.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worst_gene_id() {
        let variant = Variant {
            chrom: "1".to_string(),
            pos: 100,
            ref_allele: "A".to_string(),
            alt: "T".to_string(),
            rsid: String::new(),
            annotation: Annotation {
                group: "missense".to_string(),
                transcripts: vec![
                    TranscriptAnnotation {
                        gene_id: "ENSG01".to_string(),
                        consequence: "intron_variant".to_string(),
                    },
                    TranscriptAnnotation {
                        gene_id: "ENSG02".to_string(),
                        consequence: "missense_variant".to_string(),
                    },
                ],
                worst_annotation_index: 1,
                freqs: HashMap::new(),
            },
            genotypes: HashMap::new(),
        };
        assert_eq!(variant.worst_gene_id(), Some("ENSG02"));
    }
}
