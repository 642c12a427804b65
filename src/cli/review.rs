//! Review commands - create, update, merge, close, status

use crate::cli::context::ReviewContext;
use crate::cli::progress::CliProgress;
use crate::cli::style::{check, hyperlink_url, Stream, Stylize};
use anstream::{eprintln, println};
use review_flow::error::Result;
use review_flow::workflow::{
    CloseRequest, InitiateRequest, MergeRequest, UpdateRequest,
};

/// Run the create command
pub async fn run_create(ctx: &ReviewContext, request: InitiateRequest, verbose: bool) -> Result<()> {
    let progress = CliProgress::new(verbose);
    let outcome = ctx.orchestrator(&progress).initiate(request).await?;

    println!();
    println!(
        "{} Review {} filed for {}",
        check(),
        outcome.issue_id.accent(),
        outcome.branch.emphasis()
    );
    println!("  {}", hyperlink_url(Stream::Stdout, &outcome.issue_url));
    println!("  {} {}", "reviewer:".muted(), outcome.reviewer);
    if !outcome.cc.is_empty() {
        println!("  {} {}", "cc:".muted(), outcome.cc.join(", "));
    }
    if let Some(pr) = &outcome.pull_request {
        println!(
            "  {} #{} {}",
            "pull request:".muted(),
            pr.number,
            hyperlink_url(Stream::Stdout, &pr.html_url)
        );
    }
    for warning in &outcome.warnings {
        eprintln!("{}: {warning}", "warning".warn());
    }
    Ok(())
}

/// Run the update command
pub async fn run_update(ctx: &ReviewContext, request: UpdateRequest, verbose: bool) -> Result<()> {
    let progress = CliProgress::new(verbose);
    let outcome = ctx.orchestrator(&progress).update(request).await?;

    println!();
    println!(
        "{} Review {} updated to {}",
        check(),
        outcome.issue_id.accent(),
        short(&outcome.commit).muted()
    );
    Ok(())
}

/// Run the merge command
pub async fn run_merge(ctx: &ReviewContext, request: MergeRequest, verbose: bool) -> Result<()> {
    let progress = CliProgress::new(verbose);
    let outcome = ctx.orchestrator(&progress).merge(request).await?;

    println!();
    println!(
        "{} Merged {} as {} (review {} closed)",
        check(),
        outcome.branch.emphasis(),
        short(&outcome.commit).accent(),
        outcome.issue_id
    );
    Ok(())
}

/// Run the close command
///
/// Discarding uncommitted changes asks for confirmation first.
pub async fn run_close(
    ctx: &ReviewContext,
    branch: Option<String>,
    discard: bool,
    verbose: bool,
) -> Result<()> {
    if discard && !confirm_discard()? {
        println!("Aborted");
        return Ok(());
    }

    let progress = CliProgress::new(verbose);
    let outcome = ctx
        .orchestrator(&progress)
        .close(CloseRequest {
            branch,
            discard_changes: discard,
        })
        .await?;

    println!();
    println!(
        "{} Review {} for {} closed",
        check(),
        outcome.issue_id.accent(),
        outcome.branch.emphasis()
    );
    Ok(())
}

fn confirm_discard() -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt("Discard all uncommitted changes?")
        .default(false)
        .interact()
        .map_err(|e| review_flow::error::Error::Precondition(format!("no confirmation: {e}")))
}

/// Run the status command
pub async fn run_status(ctx: &ReviewContext, branch: Option<String>, verbose: bool) -> Result<()> {
    let progress = CliProgress::new(verbose);
    let report = ctx.orchestrator(&progress).status(branch).await?;

    let (Some(issue_id), Some(state)) = (report.issue_id, report.state) else {
        println!("No review for {}", report.branch.emphasis());
        return Ok(());
    };

    println!(
        "{}: review {} is {}",
        report.branch.emphasis(),
        issue_id.accent(),
        state.to_string().emphasis()
    );
    if let Some(url) = &report.issue_url {
        println!("  {}", hyperlink_url(Stream::Stdout, url));
    }
    if let Some(issue) = &report.issue {
        println!("  {} {}", "subject:".muted(), issue.subject);
        if let Some(reviewer) = &issue.reviewer {
            println!("  {} {reviewer}", "reviewer:".muted());
        }
        let approval = if issue.approved {
            "approved".success().to_string()
        } else {
            "not approved".warn().for_stdout().to_string()
        };
        println!("  {approval}");
    }
    Ok(())
}

fn short(commit: &str) -> &str {
    commit.get(..12).unwrap_or(commit)
}
