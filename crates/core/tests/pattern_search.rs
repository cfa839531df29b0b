use pinpoint_core::model::MatchResult;
use pinpoint_core::services::{MaskedPatternMatcher, PatternHit};
use pinpoint_core::{MaskedPattern, ScriptedSession};

fn pattern(text: &str) -> MaskedPattern {
    MaskedPattern::parse(text).unwrap()
}

fn search_cmd(p: &MaskedPattern) -> String {
    format!("/x {}", p.host_encoding())
}

#[test]
fn extracts_single_address_from_blank_padded_output() {
    let p = pattern("F. 0F 1C F8");
    let mut session = ScriptedSession::new().respond(search_cmd(&p), "\n0x1000 extra text\n\n");
    let hits = MaskedPatternMatcher::new().search(&mut session, &p).unwrap();
    assert_eq!(hits, vec![MatchResult::new(0x1000)]);
}

#[test]
fn empty_output_means_no_hits() {
    let p = pattern("2D E9 F. 4.");
    let mut session = ScriptedSession::new();
    assert!(MaskedPatternMatcher::new().search(&mut session, &p).unwrap().is_empty());
    assert_eq!(session.history(), ["/x 2de9f040:fffff0f0"]);
}

#[test]
fn duplicate_hits_collapse_keeping_first_position() {
    let p = pattern("55 41 57");
    let mut session = ScriptedSession::new()
        .respond(search_cmd(&p), "0x3000 hit0_0\n0x1000 hit0_1\n0x3000 hit0_2\n");
    let hits = MaskedPatternMatcher::new().search(&mut session, &p).unwrap();
    assert_eq!(hits, vec![MatchResult::new(0x3000), MatchResult::new(0x1000)]);
}

#[test]
fn stops_at_first_pattern_with_hits() {
    let patterns = vec![pattern("F. 0F 1C F8"), pattern("F. 43 01 D1"), pattern("FF 43 01 D1")];
    let mut session = ScriptedSession::new()
        .respond(search_cmd(&patterns[1]), "0x4000 hit1_0\n0x8000 hit1_1\n")
        .respond(search_cmd(&patterns[2]), "0x9000 hit2_0\n");

    let hit = MaskedPatternMatcher::new().first_hit(&mut session, &patterns).unwrap();
    assert_eq!(hit, Some(PatternHit { index: 1, first: MatchResult::new(0x4000), total: 2 }));
    assert!(session.received(&search_cmd(&patterns[0])));
    assert!(!session.received(&search_cmd(&patterns[2])));
}

#[test]
fn no_pattern_hitting_returns_none_after_trying_all() {
    let patterns = vec![pattern("AA"), pattern("BB")];
    let mut session = ScriptedSession::new();
    assert_eq!(MaskedPatternMatcher::new().first_hit(&mut session, &patterns).unwrap(), None);
    assert_eq!(session.history().len(), 2);
}

#[test]
fn host_failure_during_search_propagates() {
    let p = pattern("AA BB");
    let mut session = ScriptedSession::new().fail(search_cmd(&p));
    assert!(MaskedPatternMatcher::new().search(&mut session, &p).is_err());
}

#[test]
fn in_memory_scan_agrees_with_wildcard_semantics() {
    // stp x29, x30, [sp, #-0x10]! ; stp x22, x21, [sp, #0x10]
    let code = [0x00, 0x00, 0x00, 0x00, 0xFD, 0x0F, 0x1C, 0xF8, 0xF6, 0x57, 0x01, 0xA9];
    let p = pattern("F. 0F 1C F8 F. 5. 01 A9");
    assert_eq!(p.scan(&code, 0x10_0000), vec![0x10_0004]);
}
