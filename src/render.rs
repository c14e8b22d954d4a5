use std::fmt::Write;

use codeseek_core::notice::{Level, Notice};
use codeseek_index::ingest::IngestPhase;
use codeseek_index::search::SearchResults;

pub fn format_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        Level::Success => "ok",
        Level::Warning => "warning",
        Level::Error => "error",
    };
    format!("[{tag}] {}", notice.message)
}

/// Success goes to stdout, warnings and errors to stderr.
pub fn print_notice(notice: &Notice) {
    let line = format_notice(notice);
    if notice.level == Level::Success {
        println!("{line}");
    } else {
        eprintln!("{line}");
    }
}

pub fn format_phase(phase: &IngestPhase) -> Option<String> {
    match phase {
        IngestPhase::Collecting => Some("Collecting files...".into()),
        IngestPhase::Indexing {
            current,
            total,
            file,
        } => Some(format!("Indexing [{current}/{total}] {file}")),
        IngestPhase::Done => None,
    }
}

pub fn format_results(results: &SearchResults) -> String {
    let mut out = String::from("### Search Results\n");
    for (i, item) in results.iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}", i + 1, item.file_name);
        out.push_str("----\n");
        for line in item.document.lines() {
            let _ = writeln!(out, "    {line}");
        }
        out.push_str("----\n");
        let _ = writeln!(out, "Explanation:\n{}", item.explanation.trim_end());
    }
    out
}

#[cfg(test)]
mod tests {
    use codeseek_index::document::file_metadata;

    use super::*;

    #[test]
    fn notices_are_tagged_by_level() {
        assert_eq!(format_notice(&Notice::success("done")), "[ok] done");
        assert_eq!(format_notice(&Notice::warning("hmm")), "[warning] hmm");
        assert_eq!(format_notice(&Notice::error("no")), "[error] no");
    }

    #[test]
    fn phases() {
        assert_eq!(
            format_phase(&IngestPhase::Indexing {
                current: 2,
                total: 5,
                file: "b.py".into(),
            })
            .as_deref(),
            Some("Indexing [2/5] b.py")
        );
        assert!(format_phase(&IngestPhase::Done).is_none());
    }

    #[test]
    fn results_list_file_snippet_and_explanation() {
        let results = SearchResults {
            documents: vec!["def f():\n    return 1".into(), "print(2)".into()],
            metadatas: vec![file_metadata("a.py"), file_metadata("b.py")],
            explanations: vec!["Returns one.\n".into(), "Prints two.".into()],
        };

        let text = format_results(&results);

        assert!(text.starts_with("### Search Results\n"));
        assert!(text.contains("1. a.py\n"));
        assert!(text.contains("    def f():\n        return 1\n"));
        assert!(text.contains("Explanation:\nReturns one.\n"));
        assert!(text.contains("2. b.py\n"));
        assert!(text.find("a.py").unwrap() < text.find("b.py").unwrap());
    }
}
