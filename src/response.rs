//! Success envelope helpers. Errors go through [`crate::error::AppError`].

use axum::{http::StatusCode, Json};
use serde::Serialize;

use crate::store::PageRequest;

#[derive(Serialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u32>,
}

impl PageMeta {
    pub fn new(page: PageRequest, total: u64) -> Self {
        PageMeta {
            page: page.page,
            page_size: page.page_size,
            total,
            total_pages: total.div_ceil(page.page_size as u64),
            next_page: None,
        }
    }

    /// Also report the following page number when there is one.
    pub fn with_next_page(mut self) -> Self {
        if (self.page as u64) < self.total_pages {
            self.next_page = Some(self.page + 1);
        }
        self
    }
}

#[derive(Serialize)]
pub struct Message {
    pub message: String,
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn paged<T: Serialize>(data: Vec<T>, meta: PageMeta) -> (StatusCode, Json<Paged<T>>) {
    (StatusCode::OK, Json(Paged { data, meta }))
}

pub fn message(text: &str) -> (StatusCode, Json<Message>) {
    ok(Message {
        message: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_counts_pages() {
        let meta = PageMeta::new(PageRequest::new(2, 10), 25);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.with_next_page().next_page, Some(3));

        let last = PageMeta::new(PageRequest::new(3, 10), 25).with_next_page();
        assert_eq!(last.next_page, None);
        assert_eq!(PageMeta::new(PageRequest::new(1, 10), 0).total_pages, 0);
    }

    #[test]
    fn meta_wire_names() {
        let v = serde_json::to_value(PageMeta::new(PageRequest::new(1, 60), 1)).unwrap();
        assert_eq!(v["pageSize"], 60);
        assert_eq!(v["totalPages"], 1);
        assert!(v.get("nextPage").is_none());
    }
}
