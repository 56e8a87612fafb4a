use regiorank::{
    run_evaluation, Direction, EvaluationRequest, Observation, Orientation, PairwiseMatrix,
    SCORE_FLOOR,
};

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Three regions over two categories, values in the mixed formats the
/// configuration tooling actually produces.
fn site_selection_request() -> EvaluationRequest {
    let observations = vec![
        Observation::new("Ganja", "Infrastructure", "Highways", 5.0, Orientation::Cost),
        Observation::new("Lankaran", "Infrastructure", "Highways", "12", Orientation::Cost),
        Observation::new("Shaki", "Infrastructure", "Highways", "8,5", Orientation::Cost),
        Observation::new("Ganja", "Infrastructure", "Electricity", 10.0, Orientation::Benefit),
        Observation::new("Lankaran", "Infrastructure", "Electricity", 4.0, Orientation::Benefit),
        Observation::new("Shaki", "Infrastructure", "Electricity", 7.0, Orientation::Benefit),
        Observation::new("Ganja", "Labor Market", "Average Salary", "1 200", Orientation::Benefit),
        Observation::new(
            "Lankaran",
            "Labor Market",
            "Average Salary",
            "850,5",
            Orientation::Benefit,
        ),
        Observation::new(
            "Shaki",
            "Labor Market",
            "Average Salary",
            "1\u{a0}050",
            Orientation::Benefit,
        ),
        Observation::new("Ganja", "Labor Market", "Workforce Density", 50.0, Orientation::Benefit),
        Observation::new(
            "Lankaran",
            "Labor Market",
            "Workforce Density",
            35.0,
            Orientation::Benefit,
        ),
        Observation::new("Shaki", "Labor Market", "Workforce Density", 20.0, Orientation::Benefit),
    ];

    let matrices = vec![
        PairwiseMatrix::from_rows(
            "General",
            labels(&["Infrastructure", "Labor Market"]),
            vec![vec![1.0, 3.0], vec![1.0 / 3.0, 1.0]],
        )
        .unwrap(),
        PairwiseMatrix::from_rows(
            "Infrastructure",
            labels(&["Highways", "Electricity"]),
            vec![vec![1.0, 2.0], vec![0.5, 1.0]],
        )
        .unwrap(),
        PairwiseMatrix::from_rows(
            "Labor Market",
            labels(&["Average Salary", "Workforce Density"]),
            vec![vec![1.0, 4.0], vec![0.25, 1.0]],
        )
        .unwrap(),
    ];

    EvaluationRequest {
        observations,
        matrices,
        sensitivity_delta: Some(0.1),
    }
}

#[test]
fn full_evaluation_ranks_all_regions() {
    let output = run_evaluation(site_selection_request()).unwrap();

    assert_eq!(output.scores.len(), 3);
    assert!(output.weight_warnings.is_empty());

    // Ganja leads or ties every criterion after normalization.
    assert_eq!(output.scores[0].region, "Ganja");
    assert_eq!(output.scores[0].rank, 1);
    assert_eq!(output.scores[0].score, 1.0);

    for score in &output.scores {
        assert!((SCORE_FLOOR..=1.0).contains(&score.score));
    }

    // Ranks are contiguous here: no ties in this dataset.
    let ranks: Vec<usize> = output.scores.iter().map(|s| s.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[test]
fn weight_tree_covers_every_matrix_and_sums_per_category() {
    let output = run_evaluation(site_selection_request()).unwrap();

    for name in ["General", "Infrastructure", "Labor Market"] {
        let weights = &output.weights[name];
        let total: f64 = weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9, "{name} sums to {total}");
    }

    // 2:1 judgment on Highways vs Electricity.
    let infra = &output.weights["Infrastructure"];
    assert!((infra["Highways"] - 2.0 / 3.0).abs() < 1e-9);
    assert!((infra["Electricity"] - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn sensitivity_report_has_two_scenarios_per_leaf() {
    let output = run_evaluation(site_selection_request()).unwrap();
    let report = output.sensitivity.unwrap();

    // General(2) + Infrastructure(2) + Labor Market(2) leaves.
    assert_eq!(report.scenarios.len(), 12);
    assert_eq!(report.baseline.len(), 3);

    for scenario in &report.scenarios {
        assert_eq!(scenario.scores.len(), 3);
        for score in &scenario.scores {
            assert!((SCORE_FLOOR..=1.0).contains(&score.score));
        }
    }

    assert!(report
        .scenario("Infrastructure", "Highways", Direction::Plus)
        .is_some());
    assert!(report
        .scenario("Infrastructure", "Highways", Direction::Minus)
        .is_some());
}

#[test]
fn reciprocity_violations_surface_as_warnings_not_errors() {
    let mut request = site_selection_request();
    request.sensitivity_delta = None;
    // 5.0 against a reciprocal slot holding 1.0.
    request.matrices[1] = PairwiseMatrix::from_rows(
        "Infrastructure",
        labels(&["Highways", "Electricity"]),
        vec![vec![1.0, 5.0], vec![1.0, 1.0]],
    )
    .unwrap();

    let output = run_evaluation(request).unwrap();
    assert_eq!(output.weight_warnings.len(), 1);
    assert_eq!(output.weight_warnings[0].matrix, "Infrastructure");
    assert_eq!(output.scores.len(), 3);
}

#[test]
fn evaluation_is_deterministic_end_to_end() {
    let a = run_evaluation(site_selection_request()).unwrap();
    let b = run_evaluation(site_selection_request()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn request_round_trips_through_json() {
    let request = site_selection_request();
    let json = serde_json::to_string(&request).unwrap();
    let back: EvaluationRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(back, request);
}

#[test]
fn output_serializes_for_downstream_consumers() {
    let output = run_evaluation(site_selection_request()).unwrap();
    let json = serde_json::to_value(&output).unwrap();
    assert!(json["scores"].as_array().is_some());
    assert!(json["weights"]["Infrastructure"]["Highways"].as_f64().is_some());
    assert_eq!(
        json["sensitivity"]["scenarios"][0]["direction"],
        serde_json::json!("plus")
    );
}
