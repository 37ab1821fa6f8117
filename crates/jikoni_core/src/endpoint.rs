//! Request boundary in front of a resource service.
//!
//! # Responsibility
//! - Decode bearer tokens and list query parameters.
//! - Reject malformed requests before the service or storage is reached.
//!
//! # Invariants
//! - `Endpoint` calls the service only after `validate()` succeeds.
//! - Limit bounds are enforced here, never in the repository.

use crate::context::CallContext;
use crate::error::{ErrorKind, ResourceError, ResourceResult};
use crate::model::page::parse_unsigned_param;
use crate::model::{Entity, PageMetadata, QueryFilter, ResultPage, DEFAULT_LIMIT, MAX_LIMIT};
use crate::service::ResourceService;
use std::marker::PhantomData;

const BEARER_SCHEME: &str = "Bearer";

pub const OFFSET_KEY: &str = "offset";
pub const LIMIT_KEY: &str = "limit";
pub const TOTAL_KEY: &str = "total";

/// Extracts the token from an `Authorization` header value.
///
/// # Errors
/// - `MissingToken` when the header or the token is empty.
/// - `AuthenticationFailed` for any scheme other than `Bearer`.
pub fn bearer_token(header: &str) -> ResourceResult<String> {
    let header = header.trim();
    if header.is_empty() {
        return Err(ErrorKind::MissingToken.into());
    }
    let token = match header.strip_prefix(BEARER_SCHEME) {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim(),
        _ => {
            return Err(ResourceError::with_detail(
                ErrorKind::AuthenticationFailed,
                "authorization scheme must be Bearer",
            ))
        }
    };
    if token.is_empty() {
        return Err(ErrorKind::MissingToken.into());
    }
    Ok(token.to_string())
}

fn require_token(token: &str) -> ResourceResult<()> {
    if token.is_empty() {
        return Err(ErrorKind::MissingToken.into());
    }
    Ok(())
}

fn require_id(id: &str) -> ResourceResult<()> {
    if id.is_empty() {
        return Err(ErrorKind::MissingId.into());
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CreateRequest<E> {
    pub token: String,
    pub entity: E,
}

impl<E: Entity> CreateRequest<E> {
    pub fn new(token: impl Into<String>, entity: E) -> Self {
        Self {
            token: token.into(),
            entity,
        }
    }

    pub fn validate(&self) -> ResourceResult<()> {
        require_token(&self.token)?;
        self.entity.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRequest {
    pub token: String,
    pub id: String,
}

impl ViewRequest {
    pub fn new(token: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            id: id.into(),
        }
    }

    pub fn validate(&self) -> ResourceResult<()> {
        require_token(&self.token)?;
        require_id(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest<F> {
    pub token: String,
    pub page: PageMetadata<F>,
}

impl<F: QueryFilter> ListRequest<F> {
    pub fn new(token: impl Into<String>, page: PageMetadata<F>) -> Self {
        Self {
            token: token.into(),
            page,
        }
    }

    /// Decodes query pairs. Absent `offset`/`limit`/`total` default to
    /// 0/100/100; unknown keys are ignored.
    ///
    /// # Errors
    /// - `MalformedEntity` for unparsable numbers or metadata.
    pub fn from_query<'a>(
        token: impl Into<String>,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> ResourceResult<Self> {
        let mut page = PageMetadata::<F> {
            total: DEFAULT_LIMIT,
            ..PageMetadata::default()
        };
        for (key, value) in pairs {
            match key {
                OFFSET_KEY => page.offset = parse_unsigned_param(key, value)?,
                LIMIT_KEY => page.limit = parse_unsigned_param(key, value)?,
                TOTAL_KEY => page.total = parse_unsigned_param(key, value)?,
                _ => page.filter.apply_param(key, value)?,
            }
        }
        Ok(Self::new(token, page))
    }

    pub fn validate(&self) -> ResourceResult<()> {
        require_token(&self.token)?;
        if self.page.limit < 1 || self.page.limit > MAX_LIMIT {
            return Err(ResourceError::with_detail(
                ErrorKind::InvalidLimit,
                format!("limit {} outside 1..={MAX_LIMIT}", self.page.limit),
            ));
        }
        if i64::try_from(self.page.offset).is_err() {
            return Err(ResourceError::with_detail(
                ErrorKind::InvalidOffset,
                format!("offset {} exceeds storage range", self.page.offset),
            ));
        }
        Ok(())
    }
}

/// Sparse update: `entity.id` names the target, other non-empty fields are
/// applied.
#[derive(Debug, Clone)]
pub struct UpdateRequest<E> {
    pub token: String,
    pub entity: E,
}

impl<E: Entity> UpdateRequest<E> {
    pub fn new(token: impl Into<String>, id: impl Into<String>, mut entity: E) -> Self {
        entity.set_id(id.into());
        Self {
            token: token.into(),
            entity,
        }
    }

    pub fn validate(&self) -> ResourceResult<()> {
        require_token(&self.token)?;
        require_id(self.entity.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub token: String,
    pub id: String,
}

impl DeleteRequest {
    pub fn new(token: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            id: id.into(),
        }
    }

    pub fn validate(&self) -> ResourceResult<()> {
        require_token(&self.token)?;
        require_id(&self.id)
    }
}

/// Validating front for a resource service.
pub struct Endpoint<E, S> {
    service: S,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, S: ResourceService<E>> Endpoint<E, S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            _entity: PhantomData,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn create(&self, ctx: &CallContext, request: CreateRequest<E>) -> ResourceResult<String> {
        request.validate()?;
        self.service.create(ctx, &request.token, request.entity)
    }

    pub fn view(&self, ctx: &CallContext, request: &ViewRequest) -> ResourceResult<E> {
        request.validate()?;
        self.service.view(ctx, &request.token, &request.id)
    }

    pub fn list(
        &self,
        ctx: &CallContext,
        request: &ListRequest<E::Filter>,
    ) -> ResourceResult<ResultPage<E>> {
        request.validate()?;
        self.service.list(ctx, &request.token, &request.page)
    }

    pub fn update(&self, ctx: &CallContext, request: UpdateRequest<E>) -> ResourceResult<()> {
        request.validate()?;
        self.service.update(ctx, &request.token, request.entity)
    }

    pub fn delete(&self, ctx: &CallContext, request: &DeleteRequest) -> ResourceResult<()> {
        request.validate()?;
        self.service.delete(ctx, &request.token, &request.id)
    }
}

#[cfg(test)]
mod tests {
    use super::{bearer_token, ListRequest};
    use crate::error::ErrorKind;
    use crate::model::order::OrderFilter;
    use crate::model::shop::ShopFilter;

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        assert_eq!(bearer_token("Bearer abc.def").unwrap(), "abc.def");
        assert_eq!(bearer_token("").unwrap_err().kind(), ErrorKind::MissingToken);
        assert_eq!(
            bearer_token("Bearer   ").unwrap_err().kind(),
            ErrorKind::MissingToken
        );
        assert_eq!(
            bearer_token("Basic dXNlcjpwYXNz").unwrap_err().kind(),
            ErrorKind::AuthenticationFailed
        );
    }

    #[test]
    fn query_defaults_apply_when_absent() {
        let request =
            ListRequest::<OrderFilter>::from_query("token", Vec::<(&str, &str)>::new()).unwrap();
        assert_eq!(request.page.offset, 0);
        assert_eq!(request.page.limit, 100);
        assert_eq!(request.page.total, 100);
        request.validate().unwrap();
    }

    #[test]
    fn query_decodes_filters_and_metadata() {
        let request = ListRequest::<OrderFilter>::from_query(
            "token",
            [
                ("offset", "20"),
                ("limit", "10"),
                ("status", "paid"),
                ("price", "450"),
                ("metadata", r#"{"table": 4}"#),
                ("unknown", "ignored"),
            ],
        )
        .unwrap();
        assert_eq!(request.page.offset, 20);
        assert_eq!(request.page.limit, 10);
        assert_eq!(request.page.filter.status, "paid");
        assert_eq!(request.page.filter.price, 450);
        assert_eq!(request.page.filter.metadata["table"], 4);

        let shops = ListRequest::<ShopFilter>::from_query("token", [("email", "a@b.example")])
            .unwrap();
        assert_eq!(shops.page.filter.email, "a@b.example");
    }

    #[test]
    fn unparsable_query_values_are_malformed() {
        for pairs in [
            [("limit", "ten")],
            [("offset", "-1")],
            [("metadata", "not json")],
        ] {
            let err = ListRequest::<OrderFilter>::from_query("token", pairs).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedEntity);
        }
    }

    #[test]
    fn limit_and_offset_bounds_are_enforced() {
        for limit in ["0", "101"] {
            let request =
                ListRequest::<ShopFilter>::from_query("token", [("limit", limit)]).unwrap();
            assert_eq!(request.validate().unwrap_err().kind(), ErrorKind::InvalidLimit);
        }
        let request = ListRequest::<ShopFilter>::from_query(
            "token",
            [("offset", "9223372036854775808")],
        )
        .unwrap();
        assert_eq!(request.validate().unwrap_err().kind(), ErrorKind::InvalidOffset);

        let request =
            ListRequest::<ShopFilter>::from_query("", Vec::<(&str, &str)>::new()).unwrap();
        assert_eq!(request.validate().unwrap_err().kind(), ErrorKind::MissingToken);
    }
}
