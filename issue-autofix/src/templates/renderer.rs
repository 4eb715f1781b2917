//! Template renderer.

use crate::analysis::{AnalysisResult, FIXABLE_THRESHOLD};
use crate::issues::IssueDetails;
use crate::pipeline::RunStage;
use crate::platform::PrReference;
use handlebars::{no_escape, Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use serde_json::{json, Value};

const FIXING_COMMENT: &str = "\
🔍 I'm attempting to fix this issue. I'll create a branch `{{branch}}` and open a pull request if successful.";

const NOT_FIXABLE_COMMENT: &str = "\
🤖 I analyzed this issue but it doesn't look like something I can fix automatically \
(fix potential {{fix_potential}}, needs {{threshold}}). A human developer will need to take a look.

<details>
<summary>Analysis</summary>

```
{{summary}}```
</details>";

const NO_FIX_COMMENT: &str = "\
❌ I was unable to automatically fix this issue: the fix tool finished without proposing any changes. \
A human developer will need to take a look.";

const FAILED_COMMENT: &str = "\
❌ The automated fix failed during the **{{stage}}** stage: {{error}}
{{#if (eq stage \"committing\")}}
Some files may already have been written to the branch `{{branch}}`. It can be deleted safely.
{{/if}}{{#if (eq stage \"pull_requesting\")}}
The changes were committed to the branch `{{branch}}`, but the pull request could not be opened.
{{/if}}
A human developer will need to take a look.";

const CANCELLED_COMMENT: &str = "\
⚠️ The automated fix was stopped before it finished. If the branch `{{branch}}` exists, \
it may hold partial work and can be deleted safely.

A human developer will need to take a look.";

const SUCCESS_COMMENT: &str = "\
✅ I've created a pull request with a potential fix: {{url}}

Please review the changes. If the fix looks good, merging the pull request will close this issue.";

const ERROR_COMMENT: &str = "\
❌ An error occurred while trying to fix this issue: {{error}}

A human developer will need to take a look.";

const PR_BODY: &str = "\
This PR was automatically generated to fix issue #{{number}}.

{{solution}}

Closes #{{number}}";

/// Creates a configured Handlebars registry with custom helpers.
///
/// The registry is configured with:
/// - No HTML escaping (for markdown output)
/// - Strict mode (catches missing variables)
/// - `eq` helper for equality comparisons
#[must_use]
pub fn create_handlebars_registry() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(no_escape);
    hbs.set_strict_mode(true);
    hbs.register_helper("eq", Box::new(eq_helper));
    hbs
}

/// Usage: `{{#if (eq variable "value")}}...{{/if}}`
fn eq_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param1 = h.param(0).and_then(|v| v.value().as_str());
    let param2 = h.param(1).and_then(|v| v.value().as_str());

    let result = match (param1, param2) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };

    out.write(if result { "true" } else { "" })?;
    Ok(())
}

/// Renders issue comments and pull request bodies.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Creates a new template renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlebars: create_handlebars_registry(),
        }
    }

    /// Comment posted when the fix attempt starts.
    pub fn render_fixing_comment(&self, branch: &str) -> Result<String, super::TemplateError> {
        self.render_template(FIXING_COMMENT, &json!({ "branch": branch }))
    }

    /// Comment posted when analysis rules out an automated fix.
    pub fn render_not_fixable_comment(
        &self,
        analysis: &AnalysisResult,
    ) -> Result<String, super::TemplateError> {
        let data = json!({
            "fix_potential": format!("{:.2}", analysis.fix_potential),
            "threshold": format!("{FIXABLE_THRESHOLD:.2}"),
            "summary": analysis.summary(),
        });
        self.render_template(NOT_FIXABLE_COMMENT, &data)
    }

    /// Comment posted when the tool ran but proposed no edits.
    pub fn render_no_fix_comment(&self) -> Result<String, super::TemplateError> {
        self.render_template(NO_FIX_COMMENT, &json!({}))
    }

    /// Comment posted when a stage fails.
    ///
    /// # Arguments
    ///
    /// * `stage` - Stage that failed
    /// * `error` - Error description (must not contain secrets)
    /// * `branch` - Fix branch, mentioned when it may hold partial work
    pub fn render_failed_comment(
        &self,
        stage: RunStage,
        error: &str,
        branch: &str,
    ) -> Result<String, super::TemplateError> {
        let data = json!({
            "stage": stage.as_str(),
            "error": error,
            "branch": branch,
        });
        self.render_template(FAILED_COMMENT, &data)
    }

    /// Comment posted when a run is cancelled after the fix attempt started.
    pub fn render_cancelled_comment(&self, branch: &str) -> Result<String, super::TemplateError> {
        self.render_template(CANCELLED_COMMENT, &json!({ "branch": branch }))
    }

    /// Comment posted when the pull request is open.
    pub fn render_success_comment(
        &self,
        pull_request: &PrReference,
    ) -> Result<String, super::TemplateError> {
        self.render_template(SUCCESS_COMMENT, &json!({ "url": pull_request.url }))
    }

    /// Comment posted when the run hits an unexpected error.
    pub fn render_error_comment(&self, error: &str) -> Result<String, super::TemplateError> {
        self.render_template(ERROR_COMMENT, &json!({ "error": error }))
    }

    /// Renders the pull request body.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_pr_body(
        &self,
        issue: &IssueDetails,
        solution: &str,
    ) -> Result<String, super::TemplateError> {
        let data = json!({
            "number": issue.number,
            "solution": solution.trim(),
        });
        self.render_template(PR_BODY, &data)
    }

    fn render_template(&self, template: &str, data: &Value) -> Result<String, super::TemplateError> {
        Ok(self.handlebars.render_template(template, data)?)
    }
}
