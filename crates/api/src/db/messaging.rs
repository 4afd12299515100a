//! Conversation + message query builders.

use sea_query::{Alias, Cond, Expr, Order, Query, SqliteQueryBuilder};

use super::tables::{Conversations, Messages};
use super::Built;

fn conversation_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Conversations::Id,
        Conversations::ParticipantOne,
        Conversations::ParticipantTwo,
        Conversations::LastMessageAt,
        Conversations::CreatedAt,
        Conversations::UpdatedAt,
    ])
}

/// Id of the conversation between `a` and `b`, stored in either order.
pub fn find_between(a: &str, b: &str) -> Built {
    Query::select()
        .column(Conversations::Id)
        .from(Conversations::Table)
        .cond_where(
            Cond::any()
                .add(
                    Cond::all()
                        .add(Expr::col(Conversations::ParticipantOne).eq(a))
                        .add(Expr::col(Conversations::ParticipantTwo).eq(b)),
                )
                .add(
                    Cond::all()
                        .add(Expr::col(Conversations::ParticipantOne).eq(b))
                        .add(Expr::col(Conversations::ParticipantTwo).eq(a)),
                ),
        )
        .order_by(Conversations::CreatedAt, Order::Asc)
        .limit(1)
        .build(SqliteQueryBuilder)
}

pub fn insert_conversation(id: &str, participant_one: &str, participant_two: &str, now: &str) -> Built {
    Query::insert()
        .into_table(Conversations::Table)
        .columns([
            Conversations::Id,
            Conversations::ParticipantOne,
            Conversations::ParticipantTwo,
            Conversations::CreatedAt,
            Conversations::UpdatedAt,
        ])
        .values_panic([
            id.into(),
            participant_one.into(),
            participant_two.into(),
            now.into(),
            now.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Bump both timestamps after a new message.
pub fn touch_conversation(id: &str, now: &str) -> Built {
    Query::update()
        .table(Conversations::Table)
        .value(Conversations::LastMessageAt, now)
        .value(Conversations::UpdatedAt, now)
        .and_where(Expr::col(Conversations::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn get_conversation(id: &str) -> Built {
    let mut q = Query::select().to_owned();
    conversation_columns(&mut q);
    q.from(Conversations::Table)
        .and_where(Expr::col(Conversations::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Conversations a user takes part in, most recently active first.
pub fn list_for_user(user_id: &str) -> Built {
    let mut q = Query::select().to_owned();
    conversation_columns(&mut q);
    q.from(Conversations::Table)
        .cond_where(
            Cond::any()
                .add(Expr::col(Conversations::ParticipantOne).eq(user_id))
                .add(Expr::col(Conversations::ParticipantTwo).eq(user_id)),
        )
        .order_by(Conversations::UpdatedAt, Order::Desc)
        .build(SqliteQueryBuilder)
}

pub fn insert_message(id: &str, conversation_id: &str, sender_id: &str, body: &str, now: &str) -> Built {
    Query::insert()
        .into_table(Messages::Table)
        .columns([
            Messages::Id,
            Messages::ConversationId,
            Messages::SenderId,
            Messages::Body,
            Messages::CreatedAt,
        ])
        .values_panic([
            id.into(),
            conversation_id.into(),
            sender_id.into(),
            body.into(),
            now.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Messages of a conversation, oldest first. Same-second messages keep insertion order.
pub fn list_messages(conversation_id: &str) -> Built {
    Query::select()
        .columns([
            Messages::Id,
            Messages::ConversationId,
            Messages::SenderId,
            Messages::Body,
            Messages::CreatedAt,
        ])
        .from(Messages::Table)
        .and_where(Expr::col(Messages::ConversationId).eq(conversation_id))
        .order_by(Messages::CreatedAt, Order::Asc)
        .order_by(Alias::new("rowid"), Order::Asc)
        .build(SqliteQueryBuilder)
}
