mod common;

use common::fixtures::*;
use common::{TestResult, compose, pieces_on_page, snapshot};
use galley::layout::FlowStatus;
use serde_json::json;

#[test]
fn long_document_paginates_and_settles() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    // 30 paragraphs of 7 lines each; 45 lines fit a Letter page.
    let outcome = compose(doc(vec![lorem(30, 80)]))?;
    assert!(outcome.report.pages >= 4, "got {} pages", outcome.report.pages);
    assert_eq!(outcome.report.final_flow, Some(FlowStatus::Settled));
    assert_eq!(outcome.report.skipped, 0);

    let snap = snapshot(&outcome);
    assert!(snap.stories.iter().all(|s| !s.overflows));
    assert_eq!(snap.pages.len(), outcome.report.pages);
    Ok(())
}

#[test]
fn trailing_page_break_adds_no_page() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let plain = compose(doc(vec![lorem(3, 20)]))?;
    let with_break = compose(doc(vec![lorem(3, 20), vec![page_break()]]))?;
    assert_eq!(plain.report.pages, 1);
    assert_eq!(with_break.report.pages, plain.report.pages);
    Ok(())
}

#[test]
fn page_break_moves_following_text() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let outcome = compose(doc(vec![para("First page"), vec![page_break()], para("Second page")]))?;
    assert_eq!(outcome.report.pages, 2);
    Ok(())
}

#[test]
fn layout_directive_switches_orientation() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let outcome = compose(doc(vec![
        para("Portrait"),
        vec![layout(json!({ "orientation": "landscape" }))],
        para("Landscape"),
    ]))?;
    let snap = snapshot(&outcome);
    assert_eq!(snap.pages.len(), 2);
    assert_eq!(snap.pages[0].bounds.width, 612.0);
    assert_eq!(snap.pages[1].bounds.width, 792.0);
    assert_eq!(snap.pages[1].bounds.height, 612.0);
    Ok(())
}

#[test]
fn layout_as_first_directive_carries_the_text() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let outcome = compose(doc(vec![vec![layout(json!({ "orientation": "landscape" }))], para("hello")]))?;
    let snap = snapshot(&outcome);
    assert_eq!(snap.pages.len(), 2);
    assert_eq!(snap.pages[1].bounds.width, 792.0);
    assert_eq!(pieces_on_page(&snap, 0), 0);
    assert_eq!(pieces_on_page(&snap, 1), 1);
    assert_eq!(outcome.report.final_flow, Some(FlowStatus::Settled));
    Ok(())
}

#[test]
fn page_break_as_first_directive_starts_on_page_two() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let outcome = compose(doc(vec![vec![page_break()], para("hello")]))?;
    let snap = snapshot(&outcome);
    assert_eq!(snap.pages.len(), 2);
    assert_eq!(pieces_on_page(&snap, 0), 0);
    assert_eq!(pieces_on_page(&snap, 1), 1);
    Ok(())
}

#[test]
fn repeated_layout_directive_is_a_no_op() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let landscape = layout(json!({ "orientation": "landscape" }));
    let outcome = compose(doc(vec![
        para("One"),
        vec![landscape.clone()],
        para("Two"),
        vec![landscape],
        para("Three"),
    ]))?;
    assert_eq!(outcome.report.pages, 2);
    assert_eq!(outcome.report.processed, 8);
    Ok(())
}

#[test]
fn formatting_directives_do_not_break_text() -> TestResult {
    let _ = env_logger::builder().is_test(true).try_init();

    let outcome = compose(json!([
        text("Plain "),
        format("bold", true),
        text("bold "),
        format("italic", true),
        text("both"),
        format("bold", false),
        format("italic", false),
        paragraph(),
    ]))?;
    let snap = snapshot(&outcome);
    assert!(snap.stories[0].text.contains("Plain bold both"));
    assert_eq!(outcome.report.skipped, 0);
    Ok(())
}
