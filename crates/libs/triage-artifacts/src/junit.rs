//! JUnit XML result document parsing.
//!
//! Documents come in two shapes: a `<testsuites>` root holding
//! `<testsuite>` elements (which may nest further suites), or a bare
//! `<testsuite>` root. Both map onto [`Document`] because field matching
//! ignores the root element's own name.

use serde::Deserialize;

use crate::types::{TestResult, TestStatus};

/// Bound on stored failure/skip messages.
const MAX_SUMMARY_BYTES: usize = 1 << 20; // 1 MiB

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "testsuite", default)]
    suites: Vec<TestSuite>,
    #[serde(rename = "testcase", default)]
    cases: Vec<TestCase>,
}

#[derive(Debug, Deserialize)]
struct TestSuite {
    #[serde(rename = "testsuite", default)]
    suites: Vec<TestSuite>,
    #[serde(rename = "testcase", default)]
    cases: Vec<TestCase>,
}

#[derive(Debug, Deserialize)]
struct TestCase {
    #[serde(rename = "@name", default)]
    name: String,
    failure: Option<Detail>,
    error: Option<Detail>,
    skipped: Option<Detail>,
    #[serde(rename = "system-out")]
    system_out: Option<String>,
}

/// Body of a `<failure>`, `<error>`, or `<skipped>` element.
#[derive(Debug, Deserialize)]
struct Detail {
    #[serde(rename = "@message")]
    message: Option<String>,
    #[serde(rename = "$text")]
    text: Option<String>,
}

impl Detail {
    fn describe(&self) -> String {
        match (&self.text, &self.message) {
            (Some(text), _) if !text.trim().is_empty() => text.clone(),
            (_, Some(message)) => message.clone(),
            _ => String::new(),
        }
    }
}

impl TestCase {
    fn status(&self) -> TestStatus {
        if self.failure.is_some() {
            TestStatus::Failure
        } else if self.error.is_some() {
            TestStatus::Error
        } else if self.skipped.is_some() {
            TestStatus::Skipped
        } else {
            TestStatus::Success
        }
    }

    /// The case's failure/error/skip message, or its captured output for
    /// successes, bounded at `max` bytes.
    fn message(&self, max: usize) -> String {
        let msg = [&self.failure, &self.error, &self.skipped]
            .into_iter()
            .flatten()
            .next()
            .map(Detail::describe)
            .unwrap_or_else(|| self.system_out.clone().unwrap_or_default());
        truncate_on_char_boundary(msg, max)
    }

    fn into_result(self) -> TestResult {
        let status = self.status();
        let summary = self.message(MAX_SUMMARY_BYTES);
        let output = match &self.system_out {
            Some(output) => output.clone(),
            None => summary.clone(),
        };
        TestResult {
            test: self.name,
            status,
            output,
            summary,
        }
    }
}

fn truncate_on_char_boundary(mut s: String, max: usize) -> String {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
    s
}

fn collect_suite(suite: TestSuite, results: &mut Vec<TestResult>) {
    for case in suite.cases {
        results.push(case.into_result());
    }
    for nested in suite.suites {
        collect_suite(nested, results);
    }
}

/// Parse one JUnit document into test results. Invalid UTF-8 is replaced
/// lossily before parsing.
pub fn parse_document(buf: &[u8]) -> core::result::Result<Vec<TestResult>, quick_xml::DeError> {
    let text = String::from_utf8_lossy(buf);
    let document: Document = quick_xml::de::from_str(&text)?;

    let mut results = Vec::new();
    for case in document.cases {
        results.push(case.into_result());
    }
    for suite in document.suites {
        collect_suite(suite, &mut results);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_testsuites_root() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <testsuites>
              <testsuite name="unit">
                <testcase name="TestOne" time="0.1"/>
                <testcase name="TestTwo" time="0.2">
                  <failure message="assertion failed">expected 1, got 2

full stack trace follows</failure>
                </testcase>
                <testcase name="TestThree">
                  <skipped message="not supported"/>
                </testcase>
              </testsuite>
              <testsuite name="integration">
                <testcase name="TestFour">
                  <error message="setup crashed"/>
                </testcase>
              </testsuite>
            </testsuites>"#;

        let results = parse_document(xml.as_bytes()).unwrap();
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].test, "TestOne");
        assert_eq!(results[0].status, TestStatus::Success);
        assert_eq!(results[1].status, TestStatus::Failure);
        assert!(results[1].summary.starts_with("expected 1, got 2"));
        assert_eq!(results[2].status, TestStatus::Skipped);
        assert_eq!(results[3].status, TestStatus::Error);
        assert_eq!(results[3].summary, "setup crashed");
    }

    #[test]
    fn parses_a_bare_testsuite_root() {
        let xml = r#"<testsuite name="unit">
              <testcase name="TestOne"/>
              <testcase name="TestTwo"><failure>boom</failure></testcase>
            </testsuite>"#;

        let results = parse_document(xml.as_bytes()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].status, TestStatus::Failure);
        assert_eq!(results[1].summary, "boom");
    }

    #[test]
    fn nested_suites_are_flattened() {
        let xml = r#"<testsuites>
              <testsuite name="outer">
                <testsuite name="inner">
                  <testcase name="TestNested"/>
                </testsuite>
              </testsuite>
            </testsuites>"#;

        let results = parse_document(xml.as_bytes()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].test, "TestNested");
    }

    #[test]
    fn system_out_becomes_the_output() {
        let xml = r#"<testsuite>
              <testcase name="TestLogs">
                <system-out>captured output</system-out>
              </testcase>
            </testsuite>"#;

        let results = parse_document(xml.as_bytes()).unwrap();
        assert_eq!(results[0].output, "captured output");
        assert_eq!(results[0].status, TestStatus::Success);
    }

    #[test]
    fn malformed_documents_fail() {
        assert!(parse_document(b"<testsuites><testsuite>").is_err());
        assert!(parse_document(b"junk").is_err());
    }
}
