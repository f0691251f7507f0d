use minmax_core::{
    DataColumns, Expr, MinMaxError, MinMaxWorkspace, SampleRange, WorkspaceConfig,
};

fn midpoint(range: SampleRange) -> f64 {
    (range.low + range.high) / 2.0
}

fn workspace() -> MinMaxWorkspace {
    MinMaxWorkspace::with_sampler(WorkspaceConfig::default(), midpoint)
}

#[test]
fn test_calc_before_save_is_incomplete() {
    let mut space = workspace();
    space.add_var("X").unwrap();

    let data = DataColumns::new().with("X", 1.0).with("dX", 0.1);
    assert_eq!(
        space.calc_uncertainties(&data, 3),
        Err(MinMaxError::IncompleteEquations)
    );
}

#[test]
fn test_failed_derivation_clears_bounds() {
    let mut space = workspace();
    let x = space.add_var("X").unwrap();
    let g = space.declare_constant("G", 9.81).unwrap();

    space.save_equation(g.clone() * x).unwrap();
    assert!(space.has_complete_equations());

    let result = space.save_equation(g.clone() * 2.0);
    assert_eq!(result, Err(MinMaxError::Derivation("no variables".to_string())));
    assert_eq!(space.equation(), Some(&(g * 2.0)));
    assert!(space.min_equation().is_none());
    assert!(space.max_equation().is_none());
    assert!(!space.has_complete_equations());

    let data = DataColumns::new().with("X", 1.0).with("dX", 0.1);
    assert_eq!(
        space.calc_uncertainties(&data, 3),
        Err(MinMaxError::IncompleteEquations)
    );
}

#[test]
fn test_present_symbols_follow_equation() {
    let mut space = workspace();
    let a = space.add_var("A").unwrap();
    space.add_var("B").unwrap();
    let k = space.declare_constant("K", 2.0).unwrap();
    space.declare_constant("UNUSED", 5.0).unwrap();

    space.save_equation(k * a).unwrap();
    let vars: Vec<&str> = space.present_variables().into_iter().map(|v| v.name.as_str()).collect();
    let consts: Vec<&str> = space.present_constants().into_iter().map(|c| c.name.as_str()).collect();
    assert_eq!(vars, vec!["A"]);
    assert_eq!(consts, vec!["K"]);
}

#[test]
fn test_constants_are_substituted_during_evaluation() {
    let mut space = workspace();
    let x = space.add_var("X").unwrap();
    let k = space.declare_constant("K", 3.0).unwrap();
    space.save_equation(k * x).unwrap();

    let data = DataColumns::new().with("X", vec![1.0, 2.0]).with("dX", 0.5);
    let rows = space.calc_uncertainties(&data, 6).unwrap();
    assert!((rows[1].min - 4.5).abs() < 1e-10);
    assert!((rows[1].max - 7.5).abs() < 1e-10);
    assert!((rows[1].final_uncertainty - 1.5).abs() < 1e-10);
}

#[test]
fn test_parse_equation_resolves_registry_names() {
    let mut space = workspace();
    let m = space.add_var("M").unwrap();
    let t = space.add_var("T").unwrap();

    let parsed = space.parse_equation("4*pi^2*m/t^2").unwrap();
    assert_eq!(parsed, 4.0 * Expr::pi().pow(2.0) * m / t.pow(2.0));

    assert_eq!(
        space.parse_equation("M * Q"),
        Err(MinMaxError::UnknownSymbol("Q".to_string()))
    );
    assert!(matches!(space.parse_equation("M *"), Err(MinMaxError::Parse(_))));
}

#[test]
fn test_assigned_measurements_fill_missing_columns() {
    let mut space = workspace();
    let l = space.add_var("L").unwrap();
    let x = space.add_var("X").unwrap();
    space.assign_measurement("L", Some(1886.5), Some(1.0)).unwrap();
    space.save_equation(x / l).unwrap();

    let data = DataColumns::new().with("X", vec![30.0, 61.0]).with("dX", 0.5);
    let rows = space.calc_uncertainties(&data, 8).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].inputs["L"], 1886.5);
    assert_eq!(rows[0].inputs["dL"], 1.0);

    // explicit data wins over the assigned measurement
    let data = data.with("L", 1000.0);
    let rows = space.calc_uncertainties(&data, 8).unwrap();
    assert_eq!(rows[0].inputs["L"], 1000.0);
}

#[test]
fn test_diffraction_lab() {
    let mut space = workspace();
    let l = space.add_var("L").unwrap();
    let y = space.add_var("Y").unwrap();
    let m = space.add_var("M").unwrap();
    let x = space.add_var("X").unwrap();
    space.save_equation(m * y / (x / l)).unwrap();

    let data = DataColumns::new()
        .with("L", 1886.5)
        .with("dL", 1.0)
        .with("Y", 632.8 / 1e6)
        .with("dY", 0.0)
        .with("M", vec![1.0, 2.0, 3.0, 4.0, -1.0, -2.0, -3.0, -4.0])
        .with("dM", 0.0)
        .with("X", vec![30.0, 61.0, 90.0, 120.0, -30.0, -60.0, -89.0, -118.0])
        .with("dX", 0.5);

    let rows = space.calc_uncertainties(&data, 4).unwrap();
    assert_eq!(rows.len(), 8);
    for row in &rows[..4] {
        let value = row.inputs["M"] * row.inputs["Y"] / (row.inputs["X"] / row.inputs["L"]);
        assert!(row.min <= value + 1e-4 && value - 1e-4 <= row.max);
        assert!(row.final_uncertainty >= 0.0);
    }
}

#[test]
fn test_angle_like_variable_stays_in_domain() {
    let mut space = MinMaxWorkspace::new();
    let theta = space.declare_variable("theta", true).unwrap();
    space.save_equation(theta.asin()).unwrap();
    assert!(space.has_complete_equations());
}

#[test]
fn test_simplify_flag() {
    let mut space = workspace();
    let x = space.add_var("X").unwrap();

    space.set_equation(x.clone() * 1.0 + 0.0, true).unwrap();
    assert_eq!(space.equation(), Some(&x));

    space.set_equation(x.clone() * 1.0, false).unwrap();
    assert_eq!(space.equation(), Some(&(x * 1.0)));
}

#[test]
fn test_sub_femto_divisors_evaluate() {
    let mut space = workspace();
    let q = space.add_var("Q").unwrap();
    let c = space.add_var("C").unwrap();
    space.save_equation(q / c).unwrap();

    let data = DataColumns::new()
        .with("Q", 1e-12)
        .with("dQ", 1e-14)
        .with("C", 1e-16)
        .with("dC", 1e-18);
    let rows = space.calc_uncertainties(&data, 6).unwrap();
    assert!(rows[0].min < 1e4 && 1e4 < rows[0].max);
    assert!((rows[0].min - 0.99e4 / 1.01).abs() < 1e-5);
}

#[test]
fn test_declared_names_shadow_builtin_constants() {
    let mut space = workspace();
    let x = space.add_var("X").unwrap();
    let charge = space.declare_constant("e", 1.602e-19).unwrap();

    let parsed = space.parse_equation("e * X").unwrap();
    assert_eq!(parsed, charge * x.clone());
    // undeclared pi keeps its built-in meaning
    assert_eq!(space.parse_equation("pi * X").unwrap(), Expr::pi() * x);

    space.save_equation(parsed).unwrap();
    let consts: Vec<&str> = space.present_constants().into_iter().map(|c| c.name.as_str()).collect();
    assert_eq!(consts, vec!["E"]);

    let data = DataColumns::new().with("X", 2.0).with("dX", 0.0);
    let rows = space.calc_uncertainties(&data, 30).unwrap();
    assert!((rows[0].min - 3.204e-19).abs() < 1e-30);
}

#[test]
fn test_excess_decimal_places_keep_values() {
    let mut space = workspace();
    let x = space.add_var("X").unwrap();
    space.save_equation(x * 3.0).unwrap();

    let data = DataColumns::new().with("X", 0.1).with("dX", 0.01);
    let rows = space.calc_uncertainties(&data, 400).unwrap();
    assert!(rows[0].min.is_finite() && rows[0].max.is_finite());
    assert!((rows[0].final_uncertainty - 0.03).abs() < 1e-10);
}
