//! Records decoded from store rows, and request bodies.
//!
//! Wire names keep the platform's Portuguese camelCase (`idUsuario`, `nomePlano`, ...).
//! Password hashes and reset tokens are never serialized.

mod category;
mod invoice;
mod plan;
mod user;

pub use category::*;
pub use invoice::*;
pub use plan::*;
pub use user::*;

use serde::Deserialize;

/// `?page=&pageSize=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageQuery {
    pub fn request(&self, default_page_size: i64) -> crate::store::PageRequest {
        crate::store::PageRequest::new(self.page.unwrap_or(1), self.page_size.unwrap_or(default_page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_defaults_and_clamps() {
        let q = PageQuery::default();
        let p = q.request(60);
        assert_eq!((p.page, p.page_size), (1, 60));

        let q = PageQuery {
            page: Some(0),
            page_size: Some(-3),
        };
        let p = q.request(10);
        assert_eq!((p.page, p.page_size), (1, 1));
    }
}
