use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Query-string extractor for the public listings.
///
/// A key repeated in the query string keeps its first value, where `Query`
/// would reject the request for a duplicate field. Every value is handed to
/// `T` as a string, so targets are expected to hold `Option<String>` fields
/// and interpret them leniently.
#[derive(Debug, Clone, Default)]
pub struct ListQuery<T>(pub T);

impl<T: DeserializeOwned> ListQuery<T> {
    pub fn parse(query: &str) -> Result<Self, ApiError> {
        let mut fields = Map::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            fields.entry(key.into_owned()).or_insert_with(|| Value::String(value.into_owned()));
        }
        serde_json::from_value(Value::Object(fields))
            .map(ListQuery)
            .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e)))
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ListQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::parse(parts.uri.query().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Params {
        page: Option<String>,
        price_min: Option<String>,
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let ListQuery(p) = ListQuery::<Params>::parse("page=1&page=2&priceMin=5&priceMin=9").unwrap();
        assert_eq!(p.page.as_deref(), Some("1"));
        assert_eq!(p.price_min.as_deref(), Some("5"));
    }

    #[test]
    fn decodes_and_ignores_unknown_keys() {
        let ListQuery(p) = ListQuery::<Params>::parse("page=%202+&foo=bar&&=x").unwrap();
        assert_eq!(p.page.as_deref(), Some(" 2 "));
        assert_eq!(p.price_min, None);
    }

    #[tokio::test]
    async fn extracts_from_the_request_uri() {
        let (mut parts, _) = Request::builder().uri("/api/productos?page=3&page=4").body(()).unwrap().into_parts();
        let ListQuery(p) = ListQuery::<Params>::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(p.page.as_deref(), Some("3"));

        let (mut parts, _) = Request::builder().uri("/api/productos").body(()).unwrap().into_parts();
        let ListQuery(p) = ListQuery::<Params>::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(p.page, None);
    }
}
