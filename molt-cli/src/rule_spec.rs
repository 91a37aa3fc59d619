//! Translates the `--rule` mini-language into a `Box<dyn Rule>` pipeline.
//! Argument-syntax parsing belongs at the CLI boundary, not in
//! `molt-core`, which only knows about already-constructed rules.

use std::io::{self, BufRead};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use molt_core::{check_stdin_consumers, CaseStyleRule, NamesListRule, NumberingRule, RegexRule, Rule, Style, SubstringRule, TemplateRule};

/// Parse every `--rule` spec into its rule, read stdin once if any spec
/// asked for it, and enforce the at-most-one-stdin-consumer contract.
pub fn build_pipeline(specs: &[String]) -> Result<Vec<Box<dyn Rule>>> {
    let mut pipeline: Vec<Box<dyn Rule>> = Vec::with_capacity(specs.len());
    for spec in specs {
        pipeline.push(parse_rule(spec)?);
    }
    check_stdin_consumers(&pipeline)?;
    Ok(pipeline)
}

fn parse_rule(spec: &str) -> Result<Box<dyn Rule>> {
    let (kind, rest) = spec.split_once(':').unwrap_or((spec.as_str(), ""));
    match kind {
        "sub" | "substring" => {
            let (from, to) =
                rest.split_once(':').with_context(|| format!("rule `{spec}`: expected sub:FROM:TO"))?;
            Ok(Box::new(SubstringRule { from: from.to_string(), to: to.to_string() }))
        },
        "regex" => {
            let (pattern, replacement) = rest
                .split_once(':')
                .with_context(|| format!("rule `{spec}`: expected regex:PATTERN:REPLACEMENT"))?;
            Ok(Box::new(RegexRule::new(pattern, replacement)?))
        },
        "case" => {
            let style = Style::from_str(rest).map_err(|e| anyhow::anyhow!("rule `{spec}`: {e}"))?;
            Ok(Box::new(CaseStyleRule { style }))
        },
        "number" => {
            let width = if rest.is_empty() {
                None
            } else {
                Some(rest.parse::<usize>().with_context(|| format!("rule `{spec}`: invalid width"))?)
            };
            Ok(Box::new(NumberingRule { width }))
        },
        "template" => {
            if rest.is_empty() {
                bail!("rule `{spec}`: expected template:TEMPLATE");
            }
            Ok(Box::new(TemplateRule { template: rest.to_string() }))
        },
        "stdin" => Ok(Box::new(NamesListRule { names: read_stdin_names()? })),
        other => bail!("unknown rule kind `{other}` in `{spec}`"),
    }
}

fn read_stdin_names() -> Result<Vec<String>> {
    io::stdin()
        .lock()
        .lines()
        .map(|line| line.context("failed to read replacement name from stdin"))
        .collect()
}
