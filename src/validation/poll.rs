//! Poll creation, update, vote, and listing schemas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::ValidationErrors;
use crate::domain::OptionId;
use crate::domain::options::validate_poll_options;

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 200;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
/// Minimum number of distinct options a poll needs.
pub const MIN_OPTIONS: usize = 2;
/// Maximum number of options a poll may have.
pub const MAX_OPTIONS: usize = 10;
/// Largest page size accepted by the listing endpoint.
pub const MAX_PAGE_LIMIT: u32 = 100;
/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

// ── Creation ────────────────────────────────────────────────────────────

/// Request body for `POST /polls`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollInput {
    /// Poll question, 1–200 characters.
    pub title: Option<String>,
    /// Optional description, at most 1000 characters.
    pub description: Option<String>,
    /// Option labels; 2–10 distinct non-empty labels after cleaning.
    pub options: Option<Vec<String>>,
    /// Allow identified users to vote more than once. Defaults to `false`.
    #[serde(alias = "allow_multiple_votes")]
    pub allow_multiple_votes: Option<bool>,
    /// Optional RFC 3339 expiry instant, strictly in the future.
    #[serde(alias = "expires_at")]
    pub expires_at: Option<String>,
    /// Public polls can be viewed and voted on anonymously. Defaults to `true`.
    #[serde(alias = "is_public")]
    pub is_public: Option<bool>,
}

/// A validated poll creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPoll {
    /// Trimmed title.
    pub title: String,
    /// Trimmed description; empty descriptions become `None`.
    pub description: Option<String>,
    /// Cleaned option labels in submission order.
    pub options: Vec<String>,
    /// Whether identified users may vote more than once.
    pub allow_multiple_votes: bool,
    /// Expiry instant, if any.
    pub expires_at: Option<DateTime<Utc>>,
    /// Visibility flag.
    pub is_public: bool,
}

impl CreatePollInput {
    /// Validates the payload against the creation schema at `now`.
    ///
    /// Option labels are cleaned (trimmed, de-duplicated, empties dropped)
    /// before the count limits are checked.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewPoll, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = match self.title {
            Some(title) => check_title(title, &mut errors),
            None => {
                errors.push("title", "Title is required");
                String::new()
            }
        };
        let description = check_description(self.description, &mut errors);

        let options = match self.options {
            Some(raw) => {
                let cleaned = validate_poll_options(&raw);
                if cleaned.len() < MIN_OPTIONS {
                    errors.push("options", "At least 2 options are required");
                } else if cleaned.len() > MAX_OPTIONS {
                    errors.push("options", "Maximum 10 options allowed");
                }
                cleaned
            }
            None => {
                errors.push("options", "At least 2 options are required");
                Vec::new()
            }
        };

        let expires_at = check_expiry(self.expires_at.as_deref(), now, &mut errors);

        errors.finish(NewPoll {
            title,
            description,
            options,
            allow_multiple_votes: self.allow_multiple_votes.unwrap_or(false),
            expires_at,
            is_public: self.is_public.unwrap_or(true),
        })
    }
}

// ── Update ──────────────────────────────────────────────────────────────

/// Request body for `PUT /polls/{id}`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePollInput {
    /// New title, 1–200 characters.
    pub title: Option<String>,
    /// New description, at most 1000 characters.
    pub description: Option<String>,
    /// New RFC 3339 expiry instant, strictly in the future.
    #[serde(alias = "expires_at")]
    pub expires_at: Option<String>,
    /// New visibility.
    #[serde(alias = "is_public")]
    pub is_public: Option<bool>,
}

/// A validated partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollPatch {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement description (`Some(None)` clears it).
    pub description: Option<Option<String>>,
    /// Replacement expiry instant.
    pub expires_at: Option<DateTime<Utc>>,
    /// Replacement visibility.
    pub is_public: Option<bool>,
}

impl UpdatePollInput {
    /// Validates the payload against the update schema at `now`.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint.
    pub fn validate(self, now: DateTime<Utc>) -> Result<PollPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = self.title.map(|title| check_title(title, &mut errors));
        let description = self
            .description
            .map(|description| check_description(Some(description), &mut errors));
        let expires_at = check_expiry(self.expires_at.as_deref(), now, &mut errors);

        errors.finish(PollPatch {
            title,
            description,
            expires_at,
            is_public: self.is_public,
        })
    }
}

// ── Vote ────────────────────────────────────────────────────────────────

/// Request body for `POST /polls/{id}/vote`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteInput {
    /// UUID of the chosen option.
    #[serde(alias = "option_id")]
    pub option_id: Option<String>,
}

impl VoteInput {
    /// Validates the vote payload.
    ///
    /// # Errors
    ///
    /// Rejects a missing or malformed `optionId`.
    pub fn validate(self) -> Result<OptionId, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let option_id = match self.option_id.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push("optionId", "Option ID is required");
                None
            }
            Some(raw) => match raw.parse::<OptionId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.push("optionId", "Invalid option ID");
                    None
                }
            },
        };
        match option_id {
            Some(id) => errors.finish(id),
            None => Err(errors),
        }
    }
}

// ── Listing ─────────────────────────────────────────────────────────────

/// Poll status filter for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Only polls that accept votes.
    Active,
    /// Only polls past their expiry.
    Expired,
    /// Every poll.
    #[default]
    All,
}

/// Listing sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Creation time.
    #[default]
    CreatedAt,
    /// Title, case-insensitive.
    Title,
    /// Total votes.
    VoteCount,
}

/// Listing sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

impl StatusFilter {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "expired" => Some(Self::Expired),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl SortField {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(Self::CreatedAt),
            "title" => Some(Self::Title),
            "vote_count" => Some(Self::VoteCount),
            _ => None,
        }
    }
}

impl SortOrder {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Raw query parameters for `GET /polls`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PollQueryParams {
    /// Page number, 1-indexed. Defaults to 1.
    pub page: Option<String>,
    /// Items per page, 1–100. Defaults to 10.
    pub limit: Option<String>,
    /// Case-insensitive text matched against title and description.
    pub search: Option<String>,
    /// `active`, `expired`, or `all` (default).
    pub status: Option<String>,
    /// `created_at` (default), `title`, or `vote_count`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

/// A validated listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollQuery {
    /// Page number, at least 1.
    pub page: u32,
    /// Page size, 1–100.
    pub limit: u32,
    /// Trimmed, non-empty search text.
    pub search: Option<String>,
    /// Status filter.
    pub status: StatusFilter,
    /// Sort key.
    pub sort_by: SortField,
    /// Sort direction.
    pub sort_order: SortOrder,
}

impl Default for PollQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            search: None,
            status: StatusFilter::default(),
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl PollQueryParams {
    /// Validates and applies defaults.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint.
    pub fn validate(self) -> Result<PollQuery, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let defaults = PollQuery::default();

        let page = match parse_number(self.page.as_deref(), "page", &mut errors) {
            Some(0) => {
                errors.push("page", "Page must be at least 1");
                defaults.page
            }
            Some(page) => page,
            None => defaults.page,
        };

        let limit = match parse_number(self.limit.as_deref(), "limit", &mut errors) {
            Some(limit) if (1..=MAX_PAGE_LIMIT).contains(&limit) => limit,
            Some(_) => {
                errors.push("limit", "Limit must be between 1 and 100");
                defaults.limit
            }
            None => defaults.limit,
        };

        let search = self
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let status = parse_choice(
            self.status.as_deref(),
            "status",
            StatusFilter::parse,
            "Status must be one of active, expired, all",
            &mut errors,
        )
        .unwrap_or(defaults.status);
        let sort_by = parse_choice(
            self.sort_by.as_deref(),
            "sortBy",
            SortField::parse,
            "Sort field must be one of created_at, title, vote_count",
            &mut errors,
        )
        .unwrap_or(defaults.sort_by);
        let sort_order = parse_choice(
            self.sort_order.as_deref(),
            "sortOrder",
            SortOrder::parse,
            "Sort order must be asc or desc",
            &mut errors,
        )
        .unwrap_or(defaults.sort_order);

        errors.finish(PollQuery {
            page,
            limit,
            search,
            status,
            sort_by,
            sort_order,
        })
    }
}

// ── Field checks ────────────────────────────────────────────────────────

fn check_title(title: String, errors: &mut ValidationErrors) -> String {
    let title = title.trim().to_string();
    if title.is_empty() {
        errors.push("title", "Title is required");
    } else if title.chars().count() > TITLE_MAX_CHARS {
        errors.push("title", "Title must be less than 200 characters");
    }
    title
}

fn check_description(description: Option<String>, errors: &mut ValidationErrors) -> Option<String> {
    let description = description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())?;
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        errors.push("description", "Description must be less than 1000 characters");
    }
    Some(description)
}

fn check_expiry(
    raw: Option<&str>,
    now: DateTime<Utc>,
    errors: &mut ValidationErrors,
) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(raw.trim()) {
        Ok(parsed) => {
            let expires_at = parsed.with_timezone(&Utc);
            if expires_at <= now {
                errors.push("expiresAt", "Expiry date must be in the future");
            }
            Some(expires_at)
        }
        Err(_) => {
            errors.push("expiresAt", "Expiry date must be an ISO-8601 timestamp");
            None
        }
    }
}

fn parse_number(raw: Option<&str>, field: &str, errors: &mut ValidationErrors) -> Option<u32> {
    let raw = raw?.trim();
    match raw.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(field, "Expected a whole number");
            None
        }
    }
}

fn parse_choice<T>(
    raw: Option<&str>,
    field: &str,
    parse: fn(&str) -> Option<T>,
    message: &str,
    errors: &mut ValidationErrors,
) -> Option<T> {
    let raw = raw?.trim();
    let parsed = parse(raw);
    if parsed.is_none() {
        errors.push(field, message);
    }
    parsed
}
