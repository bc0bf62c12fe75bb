//! Variant and genotype filter policy.

use crate::model::{Genotype, Variant};

/// Consequence classes counted as moderate impact or worse.
pub const MODERATE_IMPACT_CLASSES: &[&str] = &[
    "stop_gained",
    "stop_lost",
    "start_lost",
    "splice_donor_variant",
    "splice_acceptor_variant",
    "frameshift_variant",
    "initiator_codon_variant",
    "missense_variant",
    "inframe_insertion",
    "inframe_deletion",
    "protein_altering_variant",
];

#[derive(Debug, Clone)]
pub struct VariantFilter {
    pub consequence_classes: Vec<String>,
    /// (population slug, maximum allele frequency), ceilings inclusive.
    pub ref_freqs: Vec<(String, f64)>,
}

impl VariantFilter {
    /// The standard rare moderate-impact filter used for the export.
    pub fn moderate_impact() -> Self {
        Self {
            consequence_classes: MODERATE_IMPACT_CLASSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ref_freqs: vec![
                ("g1k_all".to_string(), 0.01),
                ("exac".to_string(), 0.01),
                ("exac-popmax".to_string(), 0.01),
                ("merck-wgs-3793".to_string(), 0.05),
            ],
        }
    }

    /// A variant passes when its worst consequence is in the class set and
    /// none of its known population frequencies exceed their ceiling. An
    /// absent frequency does not exclude.
    pub fn passes(&self, variant: &Variant) -> bool {
        let worst_consequence = variant
            .annotation
            .transcripts
            .get(variant.annotation.worst_annotation_index)
            .map(|t| t.consequence.as_str())
            .unwrap_or_default();
        if !self
            .consequence_classes
            .iter()
            .any(|c| c == worst_consequence)
        {
            return false;
        }

        for (population, ceiling) in &self.ref_freqs {
            if let Some(freq) = variant.annotation.freqs.get(population) {
                if *freq > *ceiling {
                    return false;
                }
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct QualityFilter {
    pub filter: String,
    pub min_gq: f64,
    pub min_ab: f64,
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self {
            filter: "pass".to_string(),
            min_gq: 30.0,
            min_ab: 15.0,
        }
    }
}

impl QualityFilter {
    /// Boundaries are inclusive: gq 30 passes a floor of 30. Allele balance
    /// is only checked when the call reports one.
    pub fn passes(&self, genotype: &Genotype) -> bool {
        if !genotype.filter.eq_ignore_ascii_case(&self.filter) {
            return false;
        }
        match genotype.gq {
            Some(gq) if gq >= self.min_gq => {}
            _ => return false,
        }
        if let Some(ab) = genotype.ab {
            if ab < self.min_ab {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Annotation, TranscriptAnnotation};
    use std::collections::HashMap;

    fn genotype(gq: Option<f64>, ab: Option<f64>, filter: &str) -> Genotype {
        Genotype {
            gq,
            ab,
            filter: filter.to_string(),
            num_alt: 1,
        }
    }

    fn variant(consequence: &str, freqs: &[(&str, f64)]) -> Variant {
        Variant {
            chrom: "1".to_string(),
            pos: 100,
            ref_allele: "A".to_string(),
            alt: "T".to_string(),
            rsid: String::new(),
            annotation: Annotation {
                group: "missense".to_string(),
                transcripts: vec![TranscriptAnnotation {
                    gene_id: "ENSG01".to_string(),
                    consequence: consequence.to_string(),
                }],
                worst_annotation_index: 0,
                freqs: freqs
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect::<HashMap<_, _>>(),
            },
            genotypes: HashMap::new(),
        }
    }

    #[test]
    fn test_gq_boundary_is_inclusive() {
        let quality = QualityFilter::default();
        assert!(!quality.passes(&genotype(Some(29.0), None, "pass")));
        assert!(quality.passes(&genotype(Some(30.0), None, "pass")));
        assert!(quality.passes(&genotype(Some(31.0), None, "pass")));
    }

    #[test]
    fn test_quality_requires_pass_filter_and_gq() {
        let quality = QualityFilter::default();
        assert!(!quality.passes(&genotype(Some(99.0), None, "LowQual")));
        // A call with no reported quality never passes.
        assert!(!quality.passes(&genotype(None, None, "pass")));
    }

    #[test]
    fn test_ab_checked_only_when_present() {
        let quality = QualityFilter::default();
        assert!(!quality.passes(&genotype(Some(50.0), Some(14.9), "pass")));
        assert!(quality.passes(&genotype(Some(50.0), Some(15.0), "pass")));
        assert!(quality.passes(&genotype(Some(50.0), None, "pass")));
    }

    #[test]
    fn test_consequence_class_filter() {
        let filter = VariantFilter::moderate_impact();
        assert!(filter.passes(&variant("missense_variant", &[])));
        assert!(filter.passes(&variant("stop_gained", &[])));
        assert!(!filter.passes(&variant("synonymous_variant", &[])));
        assert!(!filter.passes(&variant("intron_variant", &[])));
    }

    #[test]
    fn test_frequency_ceilings() {
        let filter = VariantFilter::moderate_impact();
        assert!(filter.passes(&variant("missense_variant", &[("exac", 0.01)])));
        assert!(!filter.passes(&variant("missense_variant", &[("exac", 0.011)])));
        assert!(filter.passes(&variant("missense_variant", &[("merck-wgs-3793", 0.05)])));
        assert!(!filter.passes(&variant("missense_variant", &[("merck-wgs-3793", 0.051)])));
        // Unknown population frequencies do not exclude.
        assert!(filter.passes(&variant("missense_variant", &[("gnomad", 0.5)])));
    }
}
