//! Shareable poll links.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Poll, PollId};

/// Which page a poll link points to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShareKind {
    /// The voting page.
    #[default]
    Vote,
    /// The poll detail page.
    View,
    /// The results page.
    Results,
}

/// Builds the public URL of a poll page under `base_url`.
#[must_use]
pub fn format_poll_url(base_url: &str, poll_id: PollId, kind: ShareKind) -> String {
    let base = base_url.trim_end_matches('/');
    match kind {
        ShareKind::Vote => format!("{base}/vote/{poll_id}"),
        ShareKind::View => format!("{base}/polls/{poll_id}"),
        ShareKind::Results => format!("{base}/polls/{poll_id}/results"),
    }
}

/// Short invitation text pointing at the voting page.
#[must_use]
pub fn share_text(base_url: &str, poll: &Poll) -> String {
    format!(
        "Vote on: {} - {}",
        poll.title,
        format_poll_url(base_url, poll.id, ShareKind::Vote)
    )
}

/// All public links for a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ShareLinks {
    /// Poll identifier.
    pub poll_id: PollId,
    /// Voting page URL.
    pub vote_url: String,
    /// Detail page URL.
    pub view_url: String,
    /// Results page URL.
    pub results_url: String,
    /// Ready-to-post invitation text.
    pub share_text: String,
}

impl ShareLinks {
    /// Builds every link for `poll` under `base_url`.
    #[must_use]
    pub fn for_poll(base_url: &str, poll: &Poll) -> Self {
        Self {
            poll_id: poll.id,
            vote_url: format_poll_url(base_url, poll.id, ShareKind::Vote),
            view_url: format_poll_url(base_url, poll.id, ShareKind::View),
            results_url: format_poll_url(base_url, poll.id, ShareKind::Results),
            share_text: share_text(base_url, poll),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::poll::fixtures::poll_with_counts;

    #[test]
    fn formats_each_kind() {
        let id = PollId::new();
        let base = "https://polls.example.com";
        assert_eq!(
            format_poll_url(base, id, ShareKind::Vote),
            format!("{base}/vote/{id}")
        );
        assert_eq!(
            format_poll_url(base, id, ShareKind::View),
            format!("{base}/polls/{id}")
        );
        assert_eq!(
            format_poll_url(base, id, ShareKind::Results),
            format!("{base}/polls/{id}/results")
        );
    }

    #[test]
    fn default_kind_is_vote() {
        assert_eq!(ShareKind::default(), ShareKind::Vote);
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let id = PollId::new();
        assert_eq!(
            format_poll_url("http://localhost:3000/", id, ShareKind::Vote),
            format!("http://localhost:3000/vote/{id}")
        );
    }

    #[test]
    fn share_text_mentions_title_and_vote_url() {
        let poll = poll_with_counts(&[0, 0]);
        let links = ShareLinks::for_poll("http://localhost:3000", &poll);
        assert_eq!(
            links.share_text,
            format!("Vote on: {} - {}", poll.title, links.vote_url)
        );
    }
}
