use super::*;
use crate::tier::level_of;

fn names(plan: &BucketPlan) -> Vec<&str> {
    plan.buckets
        .iter()
        .map(|bucket| bucket.name.as_str())
        .collect()
}

#[test]
fn presets_resolve_to_three_canonical_buckets() {
    assert_eq!(
        names(&BucketPlan::from_preset(Preset::Easy)),
        ["veasy", "easy", "mid"]
    );
    assert_eq!(
        names(&BucketPlan::from_preset(Preset::Mid)),
        ["easy", "mid", "hard"]
    );
    assert_eq!(
        names(&BucketPlan::from_preset(Preset::Hard)),
        ["mid", "hard", "insane"]
    );
    let easy = BucketPlan::from_preset(Preset::Easy);
    assert!(easy.buckets.iter().all(|bucket| bucket.count == 1));
    assert_eq!(easy.total_count(), 3);
}

#[test]
fn canonical_bucket_ranges_match_the_scale() {
    let buckets = canonical_buckets();
    assert_eq!(buckets.len(), 5);
    let mid = canonical_bucket("mid").expect("mid bucket");
    assert_eq!(mid.range.lo(), level_of("S3").expect("S3"));
    assert_eq!(mid.range.hi(), level_of("G5").expect("G5"));
    assert!(canonical_bucket("nightmare").is_none());
}

#[test]
fn custom_spec_parses_descending_range() {
    let plan = BucketPlan::from_custom_spec(&["warmup:B5~B4:2"]).expect("valid spec");
    assert_eq!(plan.buckets.len(), 1);
    let bucket = &plan.buckets[0];
    assert_eq!(bucket.name, "warmup");
    assert_eq!((bucket.range.lo(), bucket.range.hi()), (1, 2));
    assert_eq!(bucket.count, 2);
}

#[test]
fn custom_spec_trims_fields_and_keeps_order() {
    let plan = BucketPlan::from_custom_spec(&[" b : g4 ~ p5 : 1 ", "a:B1:3"]).expect("valid");
    assert_eq!(names(&plan), ["b", "a"]);
    assert_eq!(plan.total_count(), 4);
}

#[test]
fn duplicate_bucket_names_are_permitted() {
    let plan = BucketPlan::from_custom_spec(&["x:B5:1", "x:S5:1"]).expect("duplicates ok");
    assert_eq!(names(&plan), ["x", "x"]);
}

#[test]
fn malformed_entries_name_the_offending_entry() {
    for entry in [
        "warmup:B5",
        "warmup:B5:1:extra",
        ":B5:1",
        "warmup:B5:0",
        "warmup:B5:-1",
        "warmup:B5:two",
        "warmup:Q9:1",
    ] {
        let err = BucketPlan::from_custom_spec(&["ok:B5:1", entry]).expect_err(entry);
        match err {
            ExamError::InvalidBucketSpec { entry: reported, .. } => assert_eq!(reported, entry),
            other => panic!("unexpected error for {entry}: {other:?}"),
        }
    }
}
