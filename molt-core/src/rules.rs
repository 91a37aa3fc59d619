//! Rule pipeline driver (C6).
//!
//! A pipeline is an ordered sequence of `Rule` trait objects. For each
//! input basename, the driver feeds the original basename through every
//! rule in order, threading the candidate name along; a rule that doesn't
//! want to change the current candidate returns `Unchanged`. Once the
//! chain finishes, the driver validates the final candidate.

use std::path::MAIN_SEPARATOR;

use regex::Regex;

use crate::case_model::{self, Style};

/// Per-action context handed to every rule in the pipeline.
pub struct RuleContext<'a> {
    /// The basename this action started with, unmodified by any rule.
    pub original_basename: &'a str,
    /// The candidate produced by the previous rule in the chain (or
    /// `original_basename` for the first rule).
    pub current: &'a str,
    /// Position of this action in the input batch, 0-based. Drives
    /// numbering/template rules.
    pub index: usize,
    /// Total number of actions in the batch. Drives zero-padding width.
    pub total: usize,
}

impl<'a> RuleContext<'a> {
    pub fn extension(&self) -> Option<&str> {
        let name = self.current;
        let dot = name.rfind('.')?;
        if dot == 0 {
            return None;
        }
        Some(&name[dot + 1..])
    }

    pub fn stem(&self) -> &str {
        let name = self.current;
        match name.rfind('.') {
            Some(dot) if dot > 0 => &name[..dot],
            _ => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// Replace the running candidate with this basename.
    Keep(String),
    /// This rule has no opinion; leave the running candidate as-is.
    Unchanged,
}

pub trait Rule {
    fn apply(&mut self, ctx: &RuleContext) -> anyhow::Result<RuleOutcome>;

    /// Declares that this rule must read replacement values from stdin.
    /// At most one rule in a pipeline may return `true`.
    fn consumes_stdin(&self) -> bool {
        false
    }
}

/// Replace every occurrence of `from` with `to` in the current candidate.
pub struct SubstringRule {
    pub from: String,
    pub to: String,
}

impl Rule for SubstringRule {
    fn apply(&mut self, ctx: &RuleContext) -> anyhow::Result<RuleOutcome> {
        if !ctx.current.contains(&self.from) {
            return Ok(RuleOutcome::Unchanged);
        }
        Ok(RuleOutcome::Keep(ctx.current.replace(&self.from, &self.to)))
    }
}

/// Replace every match of a regex with a (possibly capture-referencing)
/// replacement string, using `regex`'s own `$1`/`$name` syntax.
pub struct RegexRule {
    pub pattern: Regex,
    pub replacement: String,
}

impl RegexRule {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self { pattern: Regex::new(pattern)?, replacement: replacement.into() })
    }
}

impl Rule for RegexRule {
    fn apply(&mut self, ctx: &RuleContext) -> anyhow::Result<RuleOutcome> {
        if !self.pattern.is_match(ctx.current) {
            return Ok(RuleOutcome::Unchanged);
        }
        let replaced = self.pattern.replace_all(ctx.current, self.replacement.as_str());
        Ok(RuleOutcome::Keep(replaced.into_owned()))
    }
}

/// Re-render the basename stem in a different case style, preserving the
/// extension untouched.
pub struct CaseStyleRule {
    pub style: Style,
}

impl Rule for CaseStyleRule {
    fn apply(&mut self, ctx: &RuleContext) -> anyhow::Result<RuleOutcome> {
        let stem = ctx.stem();
        let coerced = case_model::coerce(stem, self.style);
        if coerced == stem {
            return Ok(RuleOutcome::Unchanged);
        }
        let new_name = match ctx.extension() {
            Some(ext) => format!("{coerced}.{ext}"),
            None => coerced,
        };
        Ok(RuleOutcome::Keep(new_name))
    }
}

/// Inserts a sequential counter (1-based) wherever `{N}` appears in the
/// candidate, zero-padded to the width of `total`.
pub struct NumberingRule {
    pub width: Option<usize>,
}

impl Rule for NumberingRule {
    fn apply(&mut self, ctx: &RuleContext) -> anyhow::Result<RuleOutcome> {
        if !ctx.current.contains("{N}") {
            return Ok(RuleOutcome::Unchanged);
        }
        let width = self.width.unwrap_or_else(|| digit_width(ctx.total));
        let n = format!("{:0width$}", ctx.index + 1, width = width);
        Ok(RuleOutcome::Keep(ctx.current.replace("{N}", &n)))
    }
}

fn digit_width(total: usize) -> usize {
    if total <= 1 {
        1
    } else {
        (total - 1).to_string().len()
    }
}

/// Expands `{basename}`, `{ext}`, `{N}`, `{N:03}` tokens in a literal
/// template string against the current action's context.
pub struct TemplateRule {
    pub template: String,
}

impl Rule for TemplateRule {
    fn apply(&mut self, ctx: &RuleContext) -> anyhow::Result<RuleOutcome> {
        let mut out = self.template.clone();

        if let Some(pos) = out.find("{basename}") {
            out.replace_range(pos..pos + "{basename}".len(), ctx.stem());
        }
        if let Some(pos) = out.find("{ext}") {
            let ext = ctx.extension().unwrap_or_default();
            out.replace_range(pos..pos + "{ext}".len(), ext);
        }

        out = expand_padded_numbering(&out, ctx.index);
        if out.contains("{N}") {
            out = out.replace("{N}", &(ctx.index + 1).to_string());
        }

        Ok(RuleOutcome::Keep(out))
    }
}

/// Expands `{N:03}`-style tokens (zero-padded counters) in `template`.
fn expand_padded_numbering(template: &str, index: usize) -> String {
    let re = Regex::new(r"\{N:(\d+)\}").expect("static pattern is valid");
    re.replace_all(template, |caps: &regex::Captures| {
        let width: usize = caps[1].parse().unwrap_or(1);
        format!("{:0width$}", index + 1, width = width)
    })
    .into_owned()
}

/// Outcome of running the whole pipeline over one action's candidate.
/// Distinct from `RuleOutcome`, which is per-rule: this is the driver's
/// verdict on the final, fully-threaded candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// No rule changed the candidate: nothing to do for this action.
    Unchanged,
    /// A rule changed the candidate, but the final name fails validation
    /// (empty, or a path separator without `--allow-path`). Carries the
    /// rejected candidate so the caller can name it in a diagnostic.
    Invalid(String),
    /// A valid new candidate name.
    Valid(String),
}

/// Runs `pipeline` over `original_basename`, threading the candidate
/// through every rule, then validates the final result.
pub fn run_pipeline(
    pipeline: &mut [Box<dyn Rule>],
    original_basename: &str,
    index: usize,
    total: usize,
    allow_path: bool,
) -> anyhow::Result<PipelineOutcome> {
    let mut current = original_basename.to_string();
    let mut changed = false;

    for rule in pipeline.iter_mut() {
        let ctx = RuleContext { original_basename, current: &current, index, total };
        match rule.apply(&ctx)? {
            RuleOutcome::Keep(next) => {
                changed = changed || next != current;
                current = next;
            },
            RuleOutcome::Unchanged => {},
        }
    }

    if !changed {
        return Ok(PipelineOutcome::Unchanged);
    }

    if !validate_candidate(&current, allow_path) {
        return Ok(PipelineOutcome::Invalid(current));
    }

    Ok(PipelineOutcome::Valid(current))
}

fn validate_candidate(candidate: &str, allow_path: bool) -> bool {
    if candidate.is_empty() {
        return false;
    }
    if !allow_path && candidate.contains(MAIN_SEPARATOR) {
        return false;
    }
    if !allow_path && candidate.contains('/') {
        return false;
    }
    true
}

/// Assigns one replacement basename per action, in input order, from a
/// list read up front (typically one line per input, piped on stdin). The
/// CLI owns reading the lines; this rule only threads them through the
/// pipeline at the position `consumes_stdin` promised the driver it would
/// claim exclusively.
pub struct NamesListRule {
    pub names: Vec<String>,
}

impl Rule for NamesListRule {
    fn apply(&mut self, ctx: &RuleContext) -> anyhow::Result<RuleOutcome> {
        let name = self
            .names
            .get(ctx.index)
            .ok_or_else(|| anyhow::anyhow!("no replacement name supplied for action {}", ctx.index + 1))?;
        if name == ctx.current {
            Ok(RuleOutcome::Unchanged)
        } else {
            Ok(RuleOutcome::Keep(name.clone()))
        }
    }

    fn consumes_stdin(&self) -> bool {
        true
    }
}

/// Enforces that at most one rule in `pipeline` declares `consumes_stdin`.
pub fn check_stdin_consumers(pipeline: &[Box<dyn Rule>]) -> anyhow::Result<()> {
    let consumers = pipeline.iter().filter(|r| r.consumes_stdin()).count();
    if consumers > 1 {
        anyhow::bail!("at most one rule in the pipeline may consume stdin, found {consumers}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(original: &'a str, current: &'a str) -> RuleContext<'a> {
        RuleContext { original_basename: original, current, index: 0, total: 1 }
    }

    #[test]
    fn substring_rule_replaces_all_occurrences() {
        let mut rule = SubstringRule { from: "foo".into(), to: "bar".into() };
        let outcome = rule.apply(&ctx("foo_foo.txt", "foo_foo.txt")).unwrap();
        assert_eq!(outcome, RuleOutcome::Keep("bar_bar.txt".to_string()));
    }

    #[test]
    fn substring_rule_reports_unchanged_when_no_match() {
        let mut rule = SubstringRule { from: "zzz".into(), to: "bar".into() };
        let outcome = rule.apply(&ctx("foo.txt", "foo.txt")).unwrap();
        assert_eq!(outcome, RuleOutcome::Unchanged);
    }

    #[test]
    fn regex_rule_supports_capture_references() {
        let mut rule = RegexRule::new(r"v(\d+)", "version-$1").unwrap();
        let outcome = rule.apply(&ctx("v2.txt", "v2.txt")).unwrap();
        assert_eq!(outcome, RuleOutcome::Keep("version-2.txt".to_string()));
    }

    #[test]
    fn case_style_rule_preserves_extension() {
        let mut rule = CaseStyleRule { style: Style::Kebab };
        let outcome = rule.apply(&ctx("OldReport.TXT", "OldReport.TXT")).unwrap();
        assert_eq!(outcome, RuleOutcome::Keep("old-report.TXT".to_string()));
    }

    #[test]
    fn numbering_rule_zero_pads_to_batch_width() {
        let mut rule = NumberingRule { width: None };
        let ctx = RuleContext { original_basename: "f.txt", current: "file-{N}.txt", index: 3, total: 12 };
        let outcome = rule.apply(&ctx).unwrap();
        assert_eq!(outcome, RuleOutcome::Keep("file-04.txt".to_string()));
    }

    #[test]
    fn template_rule_expands_basename_ext_and_padded_number() {
        let mut rule = TemplateRule { template: "{basename}-{N:03}.{ext}".into() };
        let ctx = RuleContext { original_basename: "report.pdf", current: "report.pdf", index: 4, total: 100 };
        let outcome = rule.apply(&ctx).unwrap();
        assert_eq!(outcome, RuleOutcome::Keep("report-005.pdf".to_string()));
    }

    #[test]
    fn pipeline_threads_candidate_through_multiple_rules() {
        let mut pipeline: Vec<Box<dyn Rule>> = vec![
            Box::new(SubstringRule { from: "draft".into(), to: "final".into() }),
            Box::new(CaseStyleRule { style: Style::ScreamingSnake }),
        ];
        let result = run_pipeline(&mut pipeline, "draft-report.txt", 0, 1, false).unwrap();
        assert_eq!(result, PipelineOutcome::Valid("FINAL_REPORT.TXT".to_string()));
    }

    #[test]
    fn pipeline_is_noop_when_nothing_changes() {
        let mut pipeline: Vec<Box<dyn Rule>> =
            vec![Box::new(SubstringRule { from: "zzz".into(), to: "yyy".into() })];
        let result = run_pipeline(&mut pipeline, "report.txt", 0, 1, false).unwrap();
        assert_eq!(result, PipelineOutcome::Unchanged);
    }

    #[test]
    fn pipeline_rejects_path_separator_unless_allowed() {
        let mut pipeline: Vec<Box<dyn Rule>> =
            vec![Box::new(SubstringRule { from: "a".into(), to: "a/b".into() })];
        let result = run_pipeline(&mut pipeline, "a.txt", 0, 1, false).unwrap();
        assert_eq!(result, PipelineOutcome::Invalid("a/b.txt".to_string()));

        let mut pipeline: Vec<Box<dyn Rule>> =
            vec![Box::new(SubstringRule { from: "a".into(), to: "a/b".into() })];
        let result = run_pipeline(&mut pipeline, "a.txt", 0, 1, true).unwrap();
        assert_eq!(result, PipelineOutcome::Valid("a/b.txt".to_string()));
    }

    #[test]
    fn pipeline_rejects_empty_candidate() {
        let mut pipeline: Vec<Box<dyn Rule>> =
            vec![Box::new(SubstringRule { from: "report.txt".into(), to: String::new() })];
        let result = run_pipeline(&mut pipeline, "report.txt", 0, 1, false).unwrap();
        assert_eq!(result, PipelineOutcome::Invalid(String::new()));
    }

    struct StdinRule;
    impl Rule for StdinRule {
        fn apply(&mut self, _ctx: &RuleContext) -> anyhow::Result<RuleOutcome> {
            Ok(RuleOutcome::Unchanged)
        }
        fn consumes_stdin(&self) -> bool {
            true
        }
    }

    #[test]
    fn at_most_one_stdin_consumer_is_allowed() {
        let single: Vec<Box<dyn Rule>> = vec![Box::new(StdinRule)];
        assert!(check_stdin_consumers(&single).is_ok());

        let double: Vec<Box<dyn Rule>> = vec![Box::new(StdinRule), Box::new(StdinRule)];
        assert!(check_stdin_consumers(&double).is_err());
    }

    #[test]
    fn names_list_rule_assigns_by_index() {
        let mut rule = NamesListRule { names: vec!["one.txt".into(), "two.txt".into()] };
        let ctx = RuleContext { original_basename: "a.txt", current: "a.txt", index: 1, total: 2 };
        let outcome = rule.apply(&ctx).unwrap();
        assert_eq!(outcome, RuleOutcome::Keep("two.txt".to_string()));
        assert!(rule.consumes_stdin());
    }

    #[test]
    fn names_list_rule_errors_when_list_is_too_short() {
        let mut rule = NamesListRule { names: vec!["one.txt".into()] };
        let ctx = RuleContext { original_basename: "a.txt", current: "a.txt", index: 1, total: 2 };
        assert!(rule.apply(&ctx).is_err());
    }
}
