//! GraphQL schema for users and characters.

use std::sync::Arc;
use std::time::Duration;

use async_graphql::{
    Context, EmptySubscription, Enum, ErrorExtensions, InputObject, Object, Schema,
};
use roster_core::{Character, CliqueType, User, UserType};
use roster_graph::CallContext;
use uuid::Uuid;

use crate::error::ApiError;
use crate::repository::{EntityQuery, Repository};

pub type RosterSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Shared state handed to every resolver.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn Repository<User>>,
    pub characters: Arc<dyn Repository<Character>>,
    pub request_timeout: Duration,
}

impl AppState {
    /// A fresh context bounded by the request timeout.
    fn call_context(&self) -> CallContext {
        CallContext::background().with_timeout(self.request_timeout)
    }
}

/// Build the schema over the given repositories.
pub fn build_schema(state: AppState) -> RosterSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(state)
        .finish()
}

fn state<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a AppState> {
    ctx.data::<AppState>()
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        let code = match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Graph(e) if e.is_store_failure() => "STORE_UNAVAILABLE",
            Self::Graph(_) => "GRAPH_ERROR",
            Self::Adapter(_) => "INVALID_RECORD",
            Self::Config(_) | Self::Io(_) => "INTERNAL",
        };
        async_graphql::Error::new(self.to_string()).extend_with(|_, ext| ext.set("code", code))
    }
}

fn gql_error(e: ApiError) -> async_graphql::Error {
    if !e.is_not_found() {
        tracing::warn!(error = %e, "Resolver failed");
    }
    e.extend()
}

/// Fields `users` can be ordered by.
#[derive(Enum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum UserOrderField {
    Id,
    Name,
    UserType,
}

impl UserOrderField {
    pub fn property(&self) -> &'static str {
        match self {
            Self::Id => "uuid",
            Self::Name => "name",
            Self::UserType => "userType",
        }
    }
}

#[derive(InputObject, Debug, Clone)]
pub struct UserInput {
    /// Generated when absent.
    pub id: Option<String>,
    pub name: String,
    pub user_type: UserType,
}

#[derive(InputObject, Debug, Clone)]
pub struct CharacterInput {
    /// When set, the character must already exist.
    pub id: Option<String>,
    pub name: String,
    pub is_hero: Option<bool>,
    pub clique_type: CliqueType,
}

// ── Queries ──────────────────────────────────────────────────────

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn user(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<User> {
        let state = state(ctx)?;
        state
            .users
            .find_one(&state.call_context(), &id)
            .await
            .map_err(gql_error)
    }

    /// Users, optionally filtered by type. A `limit` of 0 returns everything.
    async fn users(
        &self,
        ctx: &Context<'_>,
        user_type: Option<UserType>,
        order_by: Option<UserOrderField>,
        #[graphql(default = false)] descending: bool,
        #[graphql(default = 0)] limit: u32,
    ) -> async_graphql::Result<Vec<User>> {
        let state = state(ctx)?;
        let mut query = EntityQuery::default()
            .descending(descending)
            .limit(u64::from(limit));
        if let Some(user_type) = user_type {
            query = query.filter("userType", user_type.as_str());
        }
        if let Some(field) = order_by {
            query = query.order_by(field.property());
        }
        state
            .users
            .find_many(&state.call_context(), &query)
            .await
            .map_err(gql_error)
    }

    async fn character(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<Character> {
        let state = state(ctx)?;
        state
            .characters
            .find_one(&state.call_context(), &id)
            .await
            .map_err(gql_error)
    }

    async fn characters(
        &self,
        ctx: &Context<'_>,
        clique_type: Option<CliqueType>,
    ) -> async_graphql::Result<Vec<Character>> {
        let state = state(ctx)?;
        let mut query = EntityQuery::default().order_by("name");
        if let Some(clique) = clique_type {
            query = query.filter("cliqueType", clique.as_str());
        }
        state
            .characters
            .find_many(&state.call_context(), &query)
            .await
            .map_err(gql_error)
    }
}

// ── Mutations ────────────────────────────────────────────────────

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn upsert_user(
        &self,
        ctx: &Context<'_>,
        input: UserInput,
    ) -> async_graphql::Result<User> {
        let state = state(ctx)?;
        let user = User {
            id: input.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            name: input.name,
            user_type: input.user_type,
        };
        state
            .users
            .upsert(&state.call_context(), &user)
            .await
            .map_err(gql_error)
    }

    async fn upsert_character(
        &self,
        ctx: &Context<'_>,
        input: CharacterInput,
    ) -> async_graphql::Result<Character> {
        let state = state(ctx)?;
        let call = state.call_context();

        let (id, is_hero) = match input.id {
            Some(id) => {
                let existing = state
                    .characters
                    .find_one(&call, &id)
                    .await
                    .map_err(gql_error)?;
                (id, input.is_hero.unwrap_or(existing.is_hero))
            }
            None => (Uuid::new_v4().to_string(), input.is_hero.unwrap_or(false)),
        };

        let character = Character {
            id,
            name: input.name,
            is_hero,
            clique_type: input.clique_type,
        };
        state
            .characters
            .upsert(&call, &character)
            .await
            .map_err(gql_error)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value as Json};

    use super::*;
    use crate::repository::InMemoryRepository;

    fn schema() -> RosterSchema {
        build_schema(AppState {
            users: Arc::new(InMemoryRepository::<User>::new()),
            characters: Arc::new(InMemoryRepository::<Character>::new()),
            request_timeout: Duration::from_secs(5),
        })
    }

    async fn run(schema: &RosterSchema, query: &str) -> Json {
        let response = schema.execute(query).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        response.data.into_json().unwrap()
    }

    #[tokio::test]
    async fn upsert_user_then_query_it() {
        let schema = schema();
        let created = run(
            &schema,
            r#"mutation { upsertUser(input: {id: "u1", name: "Ann", userType: STUDENT}) { id name userType } }"#,
        )
        .await;
        assert_eq!(
            created,
            json!({"upsertUser": {"id": "u1", "name": "Ann", "userType": "STUDENT"}})
        );

        let found = run(&schema, r#"{ user(id: "u1") { name userType } }"#).await;
        assert_eq!(found, json!({"user": {"name": "Ann", "userType": "STUDENT"}}));
    }

    #[tokio::test]
    async fn upsert_user_generates_id() {
        let schema = schema();
        let created = run(
            &schema,
            r#"mutation { upsertUser(input: {name: "Bob", userType: TEACHER}) { id } }"#,
        )
        .await;
        let id = created["upsertUser"]["id"].as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn users_filter_order_and_limit() {
        let schema = schema();
        for (id, name, kind) in [
            ("u1", "Cy", "STUDENT"),
            ("u2", "Ann", "STUDENT"),
            ("u3", "Bob", "TEACHER"),
            ("u4", "Dee", "STUDENT"),
        ] {
            run(
                &schema,
                &format!(
                    r#"mutation {{ upsertUser(input: {{id: "{id}", name: "{name}", userType: {kind}}}) {{ id }} }}"#
                ),
            )
            .await;
        }

        let students = run(
            &schema,
            "{ users(userType: STUDENT, orderBy: NAME, descending: true, limit: 2) { name } }",
        )
        .await;
        assert_eq!(students, json!({"users": [{"name": "Dee"}, {"name": "Cy"}]}));

        let everyone = run(&schema, "{ users { id } }").await;
        assert_eq!(everyone["users"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn missing_user_reports_not_found() {
        let schema = schema();
        let response = schema.execute(r#"{ user(id: "nobody") { name } }"#).await;
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, "User not found: nobody");
        let code = response.errors[0]
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("NOT_FOUND")));
    }

    #[tokio::test]
    async fn upsert_character_defaults_and_existing_state() {
        let schema = schema();
        let created = run(
            &schema,
            r#"mutation { upsertCharacter(input: {name: "Sam", cliqueType: NERDS}) { id isHero } }"#,
        )
        .await;
        assert_eq!(created["upsertCharacter"]["isHero"], json!(false));
        let id = created["upsertCharacter"]["id"].as_str().unwrap().to_string();

        run(
            &schema,
            &format!(
                r#"mutation {{ upsertCharacter(input: {{id: "{id}", name: "Sam", isHero: true, cliqueType: NERDS}}) {{ id }} }}"#
            ),
        )
        .await;

        // isHero omitted: the stored value is kept.
        let renamed = run(
            &schema,
            &format!(
                r#"mutation {{ upsertCharacter(input: {{id: "{id}", name: "Samwise", cliqueType: JOCKS}}) {{ name isHero cliqueType }} }}"#
            ),
        )
        .await;
        assert_eq!(
            renamed,
            json!({"upsertCharacter": {"name": "Samwise", "isHero": true, "cliqueType": "JOCKS"}})
        );
    }

    #[tokio::test]
    async fn upsert_character_with_unknown_id_fails() {
        let schema = schema();
        let response = schema
            .execute(
                r#"mutation { upsertCharacter(input: {id: "ghost", name: "Boo", cliqueType: KOOKS}) { id } }"#,
            )
            .await;
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].message.contains("not found"));

        let listed = run(&schema, "{ characters { id } }").await;
        assert_eq!(listed, json!({"characters": []}));
    }

    #[tokio::test]
    async fn characters_filter_by_clique() {
        let schema = schema();
        for (name, clique) in [("Zed", "JOCKS"), ("Amy", "JOCKS"), ("Kit", "KOOKS")] {
            run(
                &schema,
                &format!(
                    r#"mutation {{ upsertCharacter(input: {{name: "{name}", cliqueType: {clique}}}) {{ id }} }}"#
                ),
            )
            .await;
        }

        let jocks = run(&schema, "{ characters(cliqueType: JOCKS) { name } }").await;
        assert_eq!(jocks, json!({"characters": [{"name": "Amy"}, {"name": "Zed"}]}));
    }

    #[test]
    fn order_fields_map_to_schema_properties() {
        for field in [UserOrderField::Id, UserOrderField::Name, UserOrderField::UserType] {
            assert!(roster_core::NodeLabel::User.property(field.property()).is_some());
        }
    }
}
