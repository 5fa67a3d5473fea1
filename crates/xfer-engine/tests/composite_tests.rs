mod common;

use pretty_assertions::assert_eq;
use xfer_engine::TransferConfig;
use xfer_model::{AuxiliaryKind, JobClass};
use xfer_test_utils::{compute_job, executable, scratch_url, stage_in_file, stage_out_file, Fixture};

fn composite_for(class: JobClass) -> TransferConfig {
    TransferConfig::new().with_implementation(class, "composite")
}

#[test]
fn patterns_and_datasets_merge_into_one_sequential_job() {
    let fx = Fixture::new();
    let engine = common::engine(&fx, composite_for(JobClass::StageIn));
    let compute = compute_job("analyze", "site1");
    let mut graph = common::graph_with(&compute);
    let files = [
        stage_in_file("p.dat", "site1"),
        stage_in_file("DS_raw1", "site1"),
        executable("run.exe", "site1"),
        stage_in_file("DS_raw2", "site1"),
    ];

    let job = engine
        .create_transfer_job(&mut graph, &compute, &files, "tx_analyze", JobClass::StageIn)
        .unwrap();

    assert_eq!(job.name(), "tx_analyze");
    assert_eq!(job.class(), JobClass::StageIn);
    assert_eq!(job.executable(), "/opt/pegasus/bin/seqexec");
    assert_eq!(job.stdin(), Some("merge_tx_analyze.in"));
    assert_eq!(job.files().len(), 4);
    let constituents: Vec<&str> = job.constituents().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(constituents, ["tx_analyze", "tx_analyze_dc_0", "tx_analyze_dc_1"]);

    let wrapper_manifest = fx.submit_dir().join("tx_analyze.in");
    assert!(job
        .scheduling()
        .transfer_input_files
        .contains(wrapper_manifest.display().to_string().as_str()));

    let commands = std::fs::read_to_string(fx.submit_dir().join("merge_tx_analyze.in")).unwrap();
    let commands: Vec<&str> = commands.lines().collect();
    assert_eq!(commands.len(), 3);
    assert_eq!(commands[0], "/opt/pegasus/bin/transfer -P 4 -p 1 tx_analyze.in");
    assert_eq!(
        commands[1],
        format!(
            "/opt/dc/bin/dc-client --host localhost --port 4567 retrieve DS_raw1 '{}'",
            scratch_url("site1", "DS_raw1")
        )
    );

    assert_eq!(common::auxiliary_names(&graph, AuxiliaryKind::SetXBit), ["chmod_analyze_0"]);
    assert!(graph.has_edge("tx_analyze", "chmod_analyze_0"));
    assert!(graph.has_edge("chmod_analyze_0", "analyze"));
    assert!(graph.node("tx_analyze").is_some());
    assert!(!graph.contains("tx_analyze_dc_0"));
}

#[test]
fn stage_out_ingests_every_file() {
    let fx = Fixture::new();
    let engine = common::engine(&fx, composite_for(JobClass::StageOut));
    let compute = compute_job("analyze", "site1");
    let mut graph = common::graph_with(&compute);
    let files = [stage_out_file("out1.dat", "site1"), stage_out_file("out2.dat", "site1")];

    let job = engine
        .create_transfer_job(&mut graph, &compute, &files, "out_analyze", JobClass::StageOut)
        .unwrap();

    assert_eq!(job.class(), JobClass::StageOut);
    assert_eq!(job.constituents().len(), 2);
    assert!(job.constituents().iter().all(|c| c.class == JobClass::StageOut));

    let commands = std::fs::read_to_string(fx.submit_dir().join("merge_out_analyze.in")).unwrap();
    assert!(commands
        .lines()
        .all(|line| line.starts_with("/opt/dc/bin/dc-client --host localhost --port 4567 ingest '")));
    assert!(commands.lines().nth(1).is_some_and(|l| l.ends_with("' out2.dat")));
}

#[test]
fn patterns_only_keep_wrapper_job_under_callers_name() {
    let fx = Fixture::new();
    let engine = common::engine(
        &fx,
        composite_for(JobClass::StageIn).with_priority(JobClass::StageIn, 7),
    );
    let compute = compute_job("analyze", "site1");
    let mut graph = common::graph_with(&compute);

    let job = engine
        .create_transfer_job(
            &mut graph,
            &compute,
            &[stage_in_file("a.dat", "site1"), stage_in_file("b.dat", "site1")],
            "tx_analyze",
            JobClass::StageIn,
        )
        .unwrap();

    assert_eq!(job.executable(), "/opt/pegasus/bin/transfer");
    assert_eq!(job.arguments(), "-P 4 -p 1 tx_analyze.in");
    assert_eq!(job.stdin(), None);
    assert!(job.constituents().is_empty());
    assert_eq!(job.scheduling().priority.as_deref(), Some("7"));
}
