use flow_estimate::{DurationGenerator, EvaluationConfig, FlowError, FlowGraph, NodeId};

fn fixed(value: f64) -> DurationGenerator {
    DurationGenerator::Fixed { value }
}

fn parse(expression: &str) -> DurationGenerator {
    DurationGenerator::parse(expression).unwrap()
}

#[test]
fn serial_fixed_durations_sum_exactly() {
    let mut flow = FlowGraph::new("Serial", 1000);
    let root = flow.root();
    let a = flow.add_serial_node(root, "five", fixed(5.0)).unwrap();
    let b = flow.add_serial_node(root, "three", fixed(3.0)).unwrap();
    flow.evaluate().unwrap();

    let join = flow.result(flow.output()).unwrap();
    assert_eq!(join.cumulative_stats.mean, 8.0);
    assert_eq!(join.cumulative_stats.std_dev, 0.0);
    assert!(join.cumulative_values.iter().all(|v| *v == 8.0));
    assert_eq!(flow.result(a).unwrap().cumulative_stats.mean, 5.0);
    assert_eq!(flow.result(b).unwrap().generator_stats.mean, 3.0);
}

#[test]
fn parallel_join_takes_the_larger_branch() {
    let mut flow = FlowGraph::new("Parallel", 500);
    let root = flow.root();
    let phase = flow.add_subgraph(root, "phase").unwrap();
    flow.add_parallel_node(phase, "short", fixed(4.0)).unwrap();
    flow.add_parallel_node(phase, "long", fixed(10.0)).unwrap();
    flow.evaluate().unwrap();

    let phase_join = flow.subgraph(phase).unwrap().output;
    for id in [phase_join, flow.output()] {
        let result = flow.result(id).unwrap();
        assert_eq!(result.cumulative_stats.mean, 10.0);
        assert!(result.cumulative_values.iter().all(|v| *v == 10.0));
        assert!(result.raw_values.iter().all(|v| *v == 0.0));
    }
}

#[test]
fn join_is_elementwise_max_of_branch_totals() {
    let mut flow = FlowGraph::new("Race", 2000).with_config(EvaluationConfig::with_seed(9));
    let root = flow.root();
    let a = flow.add_parallel_node(root, "a", parse("Normal(10, 3)")).unwrap();
    let b = flow.add_parallel_node(root, "b", parse("Uniform(5, 15)")).unwrap();
    flow.evaluate().unwrap();

    let a_values = &flow.result(a).unwrap().cumulative_values;
    let b_values = &flow.result(b).unwrap().cumulative_values;
    let join = flow.result(flow.output()).unwrap();
    for (idx, value) in join.cumulative_values.iter().enumerate() {
        assert_eq!(*value, a_values[idx].max(b_values[idx]));
    }
    assert!(join.cumulative_stats.mean >= flow.result(a).unwrap().cumulative_stats.mean);
}

#[test]
fn pareto_cap_bounds_every_sample() {
    let mut flow = FlowGraph::new("Tail", 10_000).with_config(EvaluationConfig::with_seed(3));
    let root = flow.root();
    let node = flow.add_serial_node(root, "tail", parse("Pareto(1, 2, 50)")).unwrap();
    flow.evaluate().unwrap();

    let result = flow.result(node).unwrap();
    assert!(result.raw_values.iter().all(|v| *v <= 50.0 && *v >= 1.0));
}

#[test]
fn every_result_has_run_count_values() {
    let mut flow = FlowGraph::new("Lengths", 321);
    let root = flow.root();
    flow.add_serial_node(root, "a", parse("PERT(1, 2, 5)")).unwrap();
    let child = flow.add_subgraph(root, "child").unwrap();
    flow.add_parallel_node(child, "b", parse("Beta(2, 2)")).unwrap();
    flow.add_parallel_node(child, "c", parse("Bernoulli(0.5)")).unwrap();
    flow.add_serial_node(child, "d", parse("Triangle(1, 3, 4)")).unwrap();
    flow.evaluate().unwrap();

    assert_eq!(flow.results().len(), flow.node_count());
    for (_, result) in flow.results().iter() {
        assert_eq!(result.raw_values.len(), 321);
        assert_eq!(result.cumulative_values.len(), 321);
    }
}

#[test]
fn serial_cumulative_mean_adds_generator_means() {
    let mut flow = FlowGraph::new("Chain", 4000).with_config(EvaluationConfig::with_seed(17));
    let root = flow.root();
    let a = flow.add_serial_node(root, "a", parse("Normal(5, 1)")).unwrap();
    let b = flow.add_serial_node(root, "b", parse("Uniform(2, 4)")).unwrap();
    flow.evaluate().unwrap();

    let a_result = flow.result(a).unwrap();
    let b_result = flow.result(b).unwrap();
    let expected = a_result.cumulative_stats.mean + b_result.generator_stats.mean;
    assert!((b_result.cumulative_stats.mean - expected).abs() < 1e-9);
    assert!((a_result.generator_stats.mean - 5.0).abs() < 0.1);
    assert!((b_result.generator_stats.mean - 3.0).abs() < 0.05);
}

#[test]
fn same_seed_reproduces_results() {
    let build = |seed: u64| {
        let mut flow = FlowGraph::new("Seeded", 256).with_config(EvaluationConfig::with_seed(seed));
        let root = flow.root();
        flow.add_serial_node(root, "a", parse("Normal(5, 2)")).unwrap();
        flow.add_parallel_node(root, "b", parse("Pareto(1, 3)")).unwrap();
        flow.add_serial_node(root, "c", parse("PERT(1, 4, 9)")).unwrap();
        flow.evaluate().unwrap();
        flow
    };

    let first = build(1234);
    let second = build(1234);
    let other = build(4321);
    assert_eq!(first.results(), second.results());
    for ((_, a), (_, b)) in first.results().iter().zip(second.results().iter()) {
        assert_eq!(a.raw_values, b.raw_values);
        assert_eq!(a.cumulative_values, b.cumulative_values);
    }
    assert!(first.critical_path().is_some());
    assert_eq!(first.critical_path(), second.critical_path());
    assert_ne!(
        first.result(first.output()).unwrap().cumulative_values,
        other.result(other.output()).unwrap().cumulative_values
    );
}

#[test]
fn configured_percentiles_are_reported() {
    let mut flow = FlowGraph::new("Percentiles", 100).with_percentiles(vec![10.0, 0.9]);
    let root = flow.root();
    flow.add_serial_node(root, "a", fixed(2.0)).unwrap();
    flow.evaluate().unwrap();

    let stats = &flow.result(flow.output()).unwrap().cumulative_stats;
    assert_eq!(stats.percentiles.len(), 2);
    assert_eq!(stats.percentile(10.0), Some(2.0));
    assert_eq!(stats.percentile(90.0), Some(2.0));
}

#[test]
fn zero_run_count_is_a_config_error() {
    let mut flow = FlowGraph::new("Empty", 0);
    let root = flow.root();
    flow.add_serial_node(root, "a", fixed(1.0)).unwrap();
    assert!(matches!(flow.evaluate(), Err(FlowError::Config(_))));
    assert!(!flow.is_evaluated());
}

#[test]
fn empty_root_subgraph_is_structural() {
    let mut flow = FlowGraph::new("Nothing", 10);
    assert!(matches!(flow.evaluate(), Err(FlowError::Structural { .. })));
}

#[test]
fn cycles_are_rejected_before_sampling() {
    let mut flow = FlowGraph::new("Loop", 10);
    let root = flow.root();
    let a = flow.add_serial_node(root, "a", fixed(1.0)).unwrap();
    let b = flow.add_serial_node(root, "b", fixed(1.0)).unwrap();
    flow.connect(b, a).unwrap();

    assert!(matches!(flow.evaluate(), Err(FlowError::Structural { .. })));
    assert!(flow.results().is_empty());
}

#[test]
fn graph_is_evaluated_once() {
    let mut flow = FlowGraph::new("Once", 10);
    let root = flow.root();
    flow.add_serial_node(root, "a", fixed(1.0)).unwrap();
    flow.evaluate().unwrap();
    assert!(flow.is_evaluated());
    assert!(flow.metadata().created.is_some());

    match flow.evaluate() {
        Err(FlowError::Structural { node, .. }) => assert_eq!(node, NodeId(0)),
        other => panic!("expected structural error, got {other:?}"),
    }
}
