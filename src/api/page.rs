//! Canonical list and single-item response shapes.
//!
//! List endpoints answer with a bare array, a flat envelope
//! (`{data, current_page, last_page, total}`) or a nested one
//! (`{data, pagination: {...}}`). Everything is normalized into [`Page`] here so
//! nothing downstream branches on the shape.

use serde::{Deserialize, Serialize};

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  /// 1-based page number
  pub page: u32,
  pub total_pages: u32,
  /// Total number of items across all pages
  pub total: u64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawPagination {
  current_page: Option<u32>,
  last_page: Option<u32>,
  total: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawPage<T> {
  Bare(Vec<T>),
  Nested {
    data: Vec<T>,
    pagination: RawPagination,
  },
  Flat {
    data: Vec<T>,
    current_page: Option<u32>,
    last_page: Option<u32>,
    total: Option<u64>,
  },
}

impl<T> RawPage<T> {
  /// Normalize into a [`Page`]. `requested` fills in a missing page number.
  pub(crate) fn into_page(self, requested: u32) -> Page<T> {
    let (items, pagination) = match self {
      RawPage::Bare(items) => {
        // An unpaginated endpoint returned everything at once
        let total = items.len() as u64;
        return Page {
          items,
          page: requested,
          total_pages: 1,
          total,
        };
      }
      RawPage::Nested { data, pagination } => (data, pagination),
      RawPage::Flat {
        data,
        current_page,
        last_page,
        total,
      } => (
        data,
        RawPagination {
          current_page,
          last_page,
          total,
        },
      ),
    };

    let total = pagination.total.unwrap_or(items.len() as u64);
    Page {
      page: pagination.current_page.unwrap_or(requested),
      total_pages: pagination.last_page.unwrap_or(1),
      total,
      items,
    }
  }
}

/// A single record, either bare or wrapped in `{data: ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Single<T> {
  Wrapped { data: T },
  Bare(T),
}

impl<T> Single<T> {
  pub(crate) fn into_inner(self) -> T {
    match self {
      Single::Wrapped { data } => data,
      Single::Bare(value) => value,
    }
  }
}
