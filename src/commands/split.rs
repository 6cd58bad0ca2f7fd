use crate::cli::{SplitCommand, SplitTarget};
use crate::plan::SplitModeKind;
use crate::session::Session;
use crate::split::{describe_page_count, SplitResult};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub async fn run(command: SplitCommand) -> Result<Vec<PathBuf>> {
    let (target, mode) = match &command {
        SplitCommand::Range { target, .. } => (target, SplitModeKind::Range),
        SplitCommand::Pages { target } => (target, SplitModeKind::EveryPage),
        SplitCommand::Custom { target, .. } => (target, SplitModeKind::CustomRanges),
        SplitCommand::Reorder { target, .. } => (target, SplitModeKind::Reorder),
    };
    let SplitTarget { path, output_dir } = target;

    let mut session = Session::new();
    let page_count = session
        .open(path)
        .with_context(|| format!("Failed to open PDF: {}", path.display()))?;
    session.set_mode(mode);

    match &command {
        SplitCommand::Range { start, end, .. } => {
            session.set_range_params(*start, end.unwrap_or(page_count))?;
        }
        SplitCommand::Pages { .. } => {}
        SplitCommand::Custom { ranges, skip, .. } => {
            for range in ranges {
                session.add_custom_range(range.as_str());
            }
            // Highest position first so earlier positions stay put
            let mut skip = skip.clone();
            skip.sort_unstable_by(|a, b| b.cmp(a));
            skip.dedup();
            for index in skip {
                let dropped = session
                    .remove_custom_range(index)
                    .with_context(|| format!("Cannot skip range {}", index))?;
                debug!(index, range = %dropped, "skipped range");
            }
        }
        SplitCommand::Reorder { order, moves, .. } => {
            if let Some(order) = order {
                session.set_page_order(parse_order(order)?)?;
            }
            for mv in moves {
                let (from, to) = parse_move(mv)?;
                session.move_page(from, to)?;
            }
            info!(order = ?session.page_order().as_slice(), "page order");
        }
    }

    let results = session
        .split(|p| info!(percentage = p.percentage, "{}", p.message))
        .await?;
    debug!(state = %session.split_state(), "split finished");

    let written = write_results(&results, output_dir)?;
    for (result, output_path) in results.iter().zip(&written) {
        println!(
            "{} ({})",
            output_path.display(),
            describe_page_count(result.page_count)
        );
    }
    println!(
        "Split {} ({}) into {} file(s) in {}",
        path.display(),
        describe_page_count(session.page_count()),
        written.len(),
        output_dir.display()
    );

    Ok(written)
}

/// Write every result into `output_dir`, creating it if needed.
pub fn write_results<P: AsRef<Path>>(
    results: &[SplitResult],
    output_dir: P,
) -> Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let mut written = Vec::with_capacity(results.len());
    for result in results {
        let output_path = output_dir.join(&result.name);
        std::fs::write(&output_path, &result.data)
            .with_context(|| format!("Failed to save PDF: {}", output_path.display()))?;
        written.push(output_path);
    }

    Ok(written)
}

/// Parse a page order like "3,1,2" into 1-based page numbers
pub fn parse_order(s: &str) -> Result<Vec<u32>> {
    s.split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<u32>()
                .map_err(|_| anyhow!("Invalid page number in order: {}", part))
        })
        .collect()
}

/// Parse a move like "0:2" into (from, to) positions
pub fn parse_move(s: &str) -> Result<(usize, usize)> {
    let (from, to) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("Invalid move '{}', expected FROM:TO", s))?;
    let from = from
        .trim()
        .parse()
        .with_context(|| format!("Invalid move source in '{}'", s))?;
    let to = to
        .trim()
        .parse()
        .with_context(|| format!("Invalid move target in '{}'", s))?;
    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::test_support::{build_pdf, page_markers};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pdfsplit-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_move() {
        assert_eq!(parse_move("0:2").unwrap(), (0, 2));
        assert_eq!(parse_move(" 3 : 1 ").unwrap(), (3, 1));
        assert!(parse_move("3").is_err());
        assert!(parse_move("a:1").is_err());
        assert!(parse_move("-1:1").is_err());
    }

    #[test]
    fn test_parse_order() {
        assert_eq!(parse_order("3, 1,2").unwrap(), vec![3, 1, 2]);
        assert!(parse_order("3,,1").is_err());
    }

    #[tokio::test]
    async fn test_split_range_writes_file() {
        let dir = scratch_dir("range");
        let input = dir.join("input.pdf");
        std::fs::write(&input, build_pdf(10)).unwrap();
        let output_dir = dir.join("out");

        let written = run(SplitCommand::Range {
            target: SplitTarget {
                path: input,
                output_dir: output_dir.clone(),
            },
            start: 3,
            end: Some(3),
        })
        .await
        .unwrap();

        assert_eq!(written, vec![output_dir.join("pages_3-3.pdf")]);
        let bytes = std::fs::read(&written[0]).unwrap();
        assert_eq!(page_markers(&bytes), vec!["Page 3"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_split_reorder_with_moves() {
        let dir = scratch_dir("reorder");
        let input = dir.join("input.pdf");
        std::fs::write(&input, build_pdf(3)).unwrap();

        let written = run(SplitCommand::Reorder {
            target: SplitTarget {
                path: input,
                output_dir: dir.join("out"),
            },
            order: Some("2,3,1".to_string()),
            moves: vec!["2:0".to_string()],
        })
        .await
        .unwrap();

        let bytes = std::fs::read(&written[0]).unwrap();
        assert_eq!(page_markers(&bytes), vec!["Page 1", "Page 2", "Page 3"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_split_custom_without_valid_ranges() {
        let dir = scratch_dir("custom");
        let input = dir.join("input.pdf");
        std::fs::write(&input, build_pdf(3)).unwrap();

        let result = run(SplitCommand::Custom {
            target: SplitTarget {
                path: input,
                output_dir: dir.join("out"),
            },
            ranges: vec!["8-9".to_string()],
            skip: Vec::new(),
        })
        .await;

        assert!(result.is_err());
        assert!(!dir.join("out").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_split_custom_with_skipped_ranges() {
        let dir = scratch_dir("custom-skip");
        let input = dir.join("input.pdf");
        std::fs::write(&input, build_pdf(5)).unwrap();
        let output_dir = dir.join("out");

        let written = run(SplitCommand::Custom {
            target: SplitTarget {
                path: input.clone(),
                output_dir: output_dir.clone(),
            },
            ranges: vec!["1".to_string(), "2-3".to_string(), "5".to_string()],
            skip: vec![2, 0, 2],
        })
        .await
        .unwrap();

        assert_eq!(written, vec![output_dir.join("range_1.pdf")]);
        let bytes = std::fs::read(&written[0]).unwrap();
        assert_eq!(page_markers(&bytes), vec!["Page 2", "Page 3"]);

        let result = run(SplitCommand::Custom {
            target: SplitTarget {
                path: input,
                output_dir: dir.join("unused"),
            },
            ranges: vec!["1".to_string()],
            skip: vec![1],
        })
        .await;
        assert!(result.is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
