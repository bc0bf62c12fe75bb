use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::io::Read;
use std::io::Write;

use variant_export::filter::QualityFilter;
use variant_export::model::{
    Annotation, Family, Genotype, ProjectData, TranscriptAnnotation, Variant,
};
use variant_export::stores::{JsonPopulationStore, JsonReference, JsonVariantStore};
use variant_export::{ExportError, ExportJob};

fn project() -> ProjectData {
    ProjectData {
        project_id: "rare_disease".to_string(),
        families: vec![
            Family {
                family_id: "FAM1".to_string(),
                individuals: vec!["IND1".to_string(), "IND2".to_string()],
            },
            Family {
                family_id: "FAM2".to_string(),
                individuals: vec!["IND3".to_string()],
            },
        ],
    }
}

fn passing_variant(individual: &str, gq: f64) -> Variant {
    let mut genotypes = HashMap::new();
    genotypes.insert(
        individual.to_string(),
        Genotype {
            gq: Some(gq),
            ab: None,
            filter: "pass".to_string(),
            num_alt: 1,
        },
    );
    Variant {
        chrom: "1".to_string(),
        pos: 12345,
        ref_allele: "A".to_string(),
        alt: "T".to_string(),
        rsid: "rs123".to_string(),
        annotation: Annotation {
            group: "missense".to_string(),
            transcripts: vec![TranscriptAnnotation {
                gene_id: "ENSG01".to_string(),
                consequence: "missense_variant".to_string(),
            }],
            worst_annotation_index: 0,
            freqs: HashMap::from([("exac".to_string(), 0.001), ("g1k_all".to_string(), 0.002)]),
        },
        genotypes,
    }
}

fn stores() -> (JsonVariantStore, JsonReference, JsonPopulationStore) {
    let mut variants = JsonVariantStore::default();
    variants.insert("FAM1", passing_variant("IND1", 50.0));
    // Below the quality floor: filtered out.
    variants.insert("FAM1", passing_variant("IND2", 29.0));
    variants.insert("FAM2", passing_variant("IND3", 30.0));

    let mut reference = JsonReference::default();
    reference.insert("ENSG01", "BRCA1");

    let mut populations = JsonPopulationStore::default();
    populations.insert("1:12345:A:T", "exac-popmax", 0.003);

    (variants, reference, populations)
}

fn write_ids(dir: &std::path::Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("ids.txt");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    path
}

fn read_output(path: &std::path::Path) -> Vec<String> {
    let mut decoder = GzDecoder::new(std::fs::File::open(path).unwrap());
    let mut content = String::new();
    decoder.read_to_string(&mut content).unwrap();
    content.lines().map(str::to_string).collect()
}

#[test]
fn test_export_writes_filtered_rows() {
    let dir = tempfile::tempdir().unwrap();
    let project = project();
    let (variants, reference, populations) = stores();
    let ids_file = write_ids(
        dir.path(),
        "# requested individuals\nIND1\tsome-annotation\n\nIND2\nIND3\n",
    );

    let job = ExportJob::new(&project, &variants, &reference, &populations);
    let output = job.run(&ids_file, dir.path()).unwrap();

    assert_eq!(
        output.file_name().unwrap().to_str().unwrap(),
        "individuals_in_rare_disease.tsv.gz"
    );
    let lines = read_output(&output);
    assert_eq!(
        lines[0],
        "project_id\tfamily_id\tindividual_id\tgene\tchrom\tpos\tref\talt\trsid\tannotation\t\
         exac_af\t1kg_af\texac_popmax_af\tmerck_wgs_3793_af"
    );
    // IND2's call fails the gq floor, so only IND1 and IND3 produce rows.
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[1],
        "rare_disease\tFAM1\tIND1\tBRCA1\t1\t12345\tA\tT\trs123\tmissense\t0.001\t0.002\t0.003\t0"
    );
    assert!(lines[2].starts_with("rare_disease\tFAM2\tIND3\t"));
}

#[test]
fn test_invalid_ids_abort_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    let project = project();
    let (variants, reference, populations) = stores();
    let ids_file = write_ids(dir.path(), "IND1\nGHOST1\nGHOST2\n");

    let job = ExportJob::new(&project, &variants, &reference, &populations);
    let err = job.run(&ids_file, dir.path()).unwrap_err();

    match &err {
        ExportError::InvalidIndividualIds { invalid, total, .. } => {
            assert_eq!(invalid, &vec!["GHOST1".to_string(), "GHOST2".to_string()]);
            assert_eq!(*total, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("2 out of 3 ids are invalid"));
    assert!(err.to_string().contains("GHOST1, GHOST2"));

    // Nothing was written.
    assert!(!dir
        .path()
        .join("individuals_in_rare_disease.tsv.gz")
        .exists());
}

#[test]
fn test_custom_quality_filter_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    let project = project();
    let (variants, reference, populations) = stores();
    let ids_file = write_ids(dir.path(), "IND2\n");

    let mut job = ExportJob::new(&project, &variants, &reference, &populations);
    job.quality_filter = QualityFilter {
        min_gq: 20.0,
        ..QualityFilter::default()
    };
    let output = job.run(&ids_file, dir.path()).unwrap();

    // With the floor lowered, IND2's gq 29 call is included.
    assert_eq!(read_output(&output).len(), 2);
}
