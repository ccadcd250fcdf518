mod common;

use symctl::domains::geometry::{
    region_from_sample, stack_regions, Covering, Hyperrectangle, Interval, RegionKind,
};
use symctl::domains::localization::TrackedSample;
use symctl::common::ErrorKind;

#[test]
fn target_region_uses_computed_position_and_fixed_ranges() {
    let sample = TrackedSample::parse("1,0,0,0,0,2,2");
    let region = region_from_sample(&sample, RegionKind::Target, Covering::Single).unwrap();

    assert_eq!(
        region.to_string(),
        "{-1.0000,1.0000},{-1.0000,1.0000},{-3.2,3.2},{0.0,0.8}"
    );
    assert!(region.contains_position(0.0, 0.0));
    assert!(region.contains_position(1.0, -1.0));
    assert!(!region.contains_position(1.01, 0.0));
}

#[test]
fn obstacle_region_carries_obstacle_velocity_range() {
    let sample = TrackedSample::parse("7, 0.5, -0.25, 1.1, 0.0, 0.5, 0.5");
    let region = region_from_sample(&sample, RegionKind::Obstacle, Covering::Single).unwrap();

    assert_eq!(
        region.to_string(),
        "{0.2500,0.7500},{-0.5000,0.0000},{-3.2,3.2},{-2.1,2.1}"
    );
}

#[test]
fn negative_extent_still_yields_ordered_bounds() {
    let interval = Interval::around(0.0, -2.0);
    assert_eq!(interval.lo, -1.0);
    assert_eq!(interval.hi, 1.0);
}

#[test]
fn mirror_and_auxiliary_coverings_add_a_second_block() {
    let sample = TrackedSample::parse("1,0,0,0,0,2,2");

    let mirror = region_from_sample(&sample, RegionKind::Target, Covering::Mirror).unwrap();
    assert_eq!(mirror.blocks().len(), 2);
    assert_eq!(mirror.blocks()[0], mirror.blocks()[1]);

    let aux = region_from_sample(&sample, RegionKind::Target, Covering::Auxiliary).unwrap();
    let wire = aux.to_string();
    assert!(wire.ends_with("|{2.0,3.0},{2.0,3.0},{-3.2,3.2},{0.0,0.8}"), "{}", wire);
    // reached test only looks at the first block
    assert!(!aux.contains_position(2.5, 2.5));
}

#[test]
fn short_or_untracked_samples_are_rejected() {
    let short = TrackedSample::parse("1,0,0,0,0,2");
    let err = region_from_sample(&short, RegionKind::Target, Covering::Single).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedSample);

    let garbage = TrackedSample::parse("1,x,0,0,0,2,2");
    let err = region_from_sample(&garbage, RegionKind::Obstacle, Covering::Single).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedSample);

    let untracked = TrackedSample::parse("untracked");
    assert!(region_from_sample(&untracked, RegionKind::Target, Covering::Single).is_err());
}

#[test]
fn non_finite_samples_never_reach_the_wire() {
    for raw in ["1,NaN,0,0,0,1,1", "1,0,0,0,0,inf,1", "1,0,-Infinity,0,0,1,1"] {
        let err = region_from_sample(&TrackedSample::parse(raw), RegionKind::Target, Covering::Single)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedSample, "{}", raw);
    }
}

#[test]
fn stacked_regions_join_with_bar_and_empty_stack_is_empty() {
    let a = region_from_sample(&TrackedSample::parse("1,0,0,0,0,2,2"), RegionKind::Obstacle, Covering::Single)
        .unwrap();
    let b = region_from_sample(&TrackedSample::parse("2,3,3,0,0,1,1"), RegionKind::Obstacle, Covering::Single)
        .unwrap();

    let stacked = stack_regions([&a, &b]);
    assert_eq!(stacked, format!("{}|{}", a, b));
    assert_eq!(stack_regions(std::iter::empty::<&Hyperrectangle>()), "");
}

#[test]
fn wire_region_parses_back() {
    let wire = "{-1.0000,1.0000},{-1.0000,1.0000},{-3.2000,3.2000},{0.0000,0.8000}";
    let region: Hyperrectangle = wire.parse().unwrap();
    assert_eq!(region.to_string(), wire);
    assert!(region.contains_position(0.5, 0.5));

    assert!("{1,2},{3,4}".parse::<Hyperrectangle>().is_err());
}

#[test]
fn scene_regions_are_ordered_by_name_and_skip_bad_objects() {
    let scene = common::scene(&[
        ("TargetB", "2,3,3,0,0,1,1"),
        ("TargetA", "1,0,0,0,0,2,2"),
        ("TargetC", "untracked"),
        ("TargetD", "4,1,1"),
        ("Obstacle1", "5,1,1,0,0,1,1"),
        ("DeepRacer1", "9,0,0,0,0"),
    ]);

    let targets = scene.regions(RegionKind::Target, Covering::Single);
    let names: Vec<_> = targets.regions.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["TargetA", "TargetB"]);
    assert_eq!(targets.rejected.len(), 1);
    assert_eq!(targets.rejected[0].0, "TargetD");

    let obstacles = scene.regions(RegionKind::Obstacle, Covering::Single);
    assert_eq!(obstacles.regions.len(), 1);
    assert!(obstacles.stacked().ends_with("{-2.1,2.1}"));
}
