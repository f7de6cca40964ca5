#![no_main]
use libfuzzer_sys::fuzz_target;

use trxcov::model::ResultRun;

fuzz_target!(|data: &[u8]| {
    let Ok(attachment) = std::str::from_utf8(data) else {
        return;
    };
    let mut run = ResultRun::new("/results/fuzz run.trx".into());
    run.deployment_root = Some("deploy".to_string());
    // Candidate computation must not panic and always yields every rule.
    let candidates = trxcov::resolve::candidate_paths(&run, attachment);
    assert_eq!(candidates.len(), 4);
});
