use deopt_lens::aggregator::processor::LogProcessor;
use deopt_lens::aggregator::summary::{summarize, SiteKind};
use deopt_lens::aggregator::UnattributedPolicy;
use pretty_assertions::assert_eq;

const LOG: &str = "\
code-creation,LazyCompile,10,1,0x1000,256,hot /tmp/agg.js:1:1,0x1,~
code-creation,LazyCompile,10,2,0x2000,256,cold /tmp/agg.js:20:1,0x2,^
LoadIC,0x1010,3,2,3,0,1,0x1,a,,
LoadIC,0x1010,4,2,3,1,P,0x2,a,,
LoadIC,0x1010,5,2,3,P,N,0x3,a,,
LoadIC,0x2010,6,21,3,0,1,0x1,b,,
code-deopt,7,256,0x1000,-1,10,eager,<unknown>,wrong map
";

#[test]
fn test_processor_feeds_record_by_record() {
    let mut whole = LogProcessor::new(UnattributedPolicy::default());
    whole.process_text(LOG);

    let mut stepwise = LogProcessor::new(UnattributedPolicy::default());
    for (index, line) in LOG.lines().enumerate() {
        stepwise.process_record(index as u64 + 1, line);
    }

    assert_eq!(whole.finish(), stepwise.finish());
}

#[test]
fn test_deopt_without_position_uses_code_location() {
    let mut processor = LogProcessor::new(UnattributedPolicy::default());
    processor.process_text(LOG);
    let (files, _) = processor.finish();

    let file = &files["/tmp/agg.js"];
    assert_eq!(file.deopt_locations, vec!["hot:1:1"]);
    assert_eq!(file.deopts["hot:1:1"].updates[0].deopt_reason, "wrong map");
}

#[test]
fn test_summary_ranks_megamorphic_first() {
    let mut processor = LogProcessor::new(UnattributedPolicy::default());
    processor.process_text(LOG);
    let (files, diagnostics) = processor.finish();
    let analysis = deopt_lens::Analysis { files, diagnostics };

    let summary = summarize(&analysis, 3);
    assert_eq!(summary.total_ic_updates, 4);
    assert_eq!(summary.total_deopt_updates, 1);
    assert_eq!(summary.total_code_updates, 2);

    let top = &summary.hot_sites[0];
    assert_eq!(top.severity, 3);
    assert_eq!(top.kind, SiteKind::Ic);
    assert_eq!(top.location, "hot:2:3");
    assert_eq!(top.updates, 3);

    let file = &summary.files[0];
    assert_eq!(file.ic_sites, 2);
    assert_eq!(file.code_sites, 2);
    // hot:2:3 and the eager deopt are severe; both code sites are baseline/interpreted
    assert_eq!(file.severities, [1, 2, 2]);
}
