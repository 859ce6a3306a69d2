//! Stream names are strings containing a category, and optional entity
//! identifier.
//!
//! Every aggregate instance owns exactly one stream. The part of the name
//! preceding the first dash (`-`) is the *category*, usually the aggregate
//! type, and the part following it is the aggregate's ID.
//!
//! # Example Stream Names
//!
//! `bankAccount`
//!
//! Category stream name, covering every bank account.
//!
//! `bankAccount-123`
//!
//! Entity stream name. Holds the events of the bank account with the ID 123.
//!
//! `user-9f1c-42`
//!
//! Entity stream name of the user `9f1c-42`. Only the first dash separates.

use std::borrow::Cow;
use std::{fmt, str};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stream name containing a category, and optionally an ID.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamName<'a>(Cow<'a, str>);

impl<'a> StreamName<'a> {
    /// ID separator.
    ///
    /// Only the first `-` is the separator, and all other `-` characters in an
    /// ID are valid.
    ///
    /// # Example
    ///
    /// `category-id`
    pub const ID_SEPARATOR: char = '-';

    pub fn new(stream_name: impl Into<Cow<'a, str>>) -> Result<Self, EmptyStreamName> {
        let stream_name = stream_name.into();
        if stream_name.is_empty() {
            return Err(EmptyStreamName);
        }

        Ok(StreamName(stream_name))
    }

    pub fn from_parts(category: String, id: Option<&str>) -> Result<Self, EmptyStreamName> {
        match id {
            Some(id) => Ok(Self::entity(category, id)),
            None => StreamName::new(category),
        }
    }

    /// Entity stream name of `id` in `category`. Never empty, as it always
    /// holds the separator.
    pub fn entity(category: String, id: &str) -> Self {
        let mut s = category;
        s.push(Self::ID_SEPARATOR);
        s.push_str(id);

        StreamName(Cow::Owned(s))
    }

    pub fn category(&self) -> &str {
        self.split_once(Self::ID_SEPARATOR)
            .map(|(category, _)| category)
            .unwrap_or(self)
    }

    pub fn id(&self) -> Option<&str> {
        self.split_once(Self::ID_SEPARATOR).map(|(_, id)| id)
    }

    /// Returns whether a `stream_name` is a category.
    pub fn is_category(stream_name: &str) -> bool {
        !stream_name.contains(Self::ID_SEPARATOR)
    }
}

#[derive(Clone, Copy, Debug, Error)]
#[error("empty stream name")]
pub struct EmptyStreamName;

impl_eq! { StreamName<'a>, &'b str }
impl_eq! { StreamName<'a>, String }
impl_as_ref_str! { StreamName, StreamName<'a>, StreamName<'static> }
