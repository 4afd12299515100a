use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use clubhouse_api::{
    db, service, validate, ActionResult, ListConversationsResponse, ListMessagesResponse,
    MessageNotification, SendMessageRequest,
};

use crate::error::{action_response, ActionResponse, ApiErr};
use crate::notify::Notifier;
use crate::routes::auth::{require_admin_caller, AuthUser, MaybeUser};
use crate::storage::{
    conversation_from_row, message_from_row, profile_from_row, sq_execute, sq_query_map,
    sq_query_opt, Db,
};

// ---------------------------------------------------------------------------
// Member threads
// ---------------------------------------------------------------------------

/// GET /api/conversations — the caller's conversations, most recent first.
pub async fn list_conversations(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListConversationsResponse>, ApiErr> {
    let conn = db.conn();
    let conversations = sq_query_map(
        &conn,
        db::messaging::list_for_user(&user.user_id),
        conversation_from_row,
    )
    .map_err(ApiErr::from_db("list conversations"))?;
    Ok(Json(ListConversationsResponse { conversations }))
}

/// GET /api/conversations/:id/messages — participants only.
pub async fn list_messages(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ListMessagesResponse>, ApiErr> {
    let conn = db.conn();
    let conversation = sq_query_opt(
        &conn,
        db::messaging::get_conversation(&id),
        conversation_from_row,
    )
    .map_err(ApiErr::from_db("load conversation"))?
    .ok_or_else(|| ApiErr::not_found("conversation not found"))?;

    if conversation.participant_one != user.user_id && conversation.participant_two != user.user_id
    {
        return Err(ApiErr::not_found("conversation not found"));
    }

    let messages = sq_query_map(&conn, db::messaging::list_messages(&id), message_from_row)
        .map_err(ApiErr::from_db("list messages"))?;
    Ok(Json(ListMessagesResponse { messages }))
}

// ---------------------------------------------------------------------------
// Admin direct message
// ---------------------------------------------------------------------------

/// Store the message and decide whether the recipient wants a notification.
fn deliver(
    db: &Db,
    user: &MaybeUser,
    req: &SendMessageRequest,
) -> Result<(ActionResult, Option<MessageNotification>), ApiErr> {
    let conn = db.conn();
    let sender = require_admin_caller(&conn, user)?;

    let recipient_id = validate::require("recipient_id", &req.recipient_id)?;
    let body = validate::require("body", &req.body)?;

    let recipient = sq_query_opt(&conn, db::profiles::get_by_id(&recipient_id), profile_from_row)
        .map_err(ApiErr::from_db("load recipient"))?
        .ok_or_else(|| ApiErr::not_found("recipient not found"))?;
    if recipient.id == sender.id {
        return Err(ApiErr::bad_request("cannot message yourself"));
    }

    let now = service::now_sqlite();

    // The pair may be stored in either order.
    let existing = sq_query_opt(
        &conn,
        db::messaging::find_between(&sender.id, &recipient.id),
        |row| row.get::<_, String>(0),
    )
    .map_err(ApiErr::from_db("find conversation"))?;

    let conversation_id = match existing {
        Some(id) => id,
        None => {
            let id = service::new_id();
            sq_execute(
                &conn,
                db::messaging::insert_conversation(&id, &sender.id, &recipient.id, &now),
            )
            .map_err(ApiErr::from_db("create conversation"))?;
            id
        }
    };

    let stored_body = service::compose_message_body(req.subject.as_deref(), &body);
    sq_execute(
        &conn,
        db::messaging::insert_message(
            &service::new_id(),
            &conversation_id,
            &sender.id,
            &stored_body,
            &now,
        ),
    )
    .map_err(ApiErr::from_db("insert message"))?;

    sq_execute(&conn, db::messaging::touch_conversation(&conversation_id, &now))
        .map_err(ApiErr::from_db("touch conversation"))?;

    let notification = recipient.email_notifications.then(|| MessageNotification {
        recipient_user_id: recipient.id.clone(),
        sender_name: sender.display_name().to_string(),
    });

    Ok((ActionResult::ok_with_id(conversation_id), notification))
}

/// POST /api/admin/messages — send a direct message as the admin.
///
/// Answers `{success, error?, id?}` where `id` is the conversation, also for
/// bodies that fail to parse. The notification webhook runs detached and only
/// logs its outcome.
pub async fn send_admin_message(
    State(db): State<Db>,
    State(notifier): State<Notifier>,
    user: MaybeUser,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> ActionResponse {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return ApiErr::from(rejection).into_action(),
    };
    let result = deliver(&db, &user, &req).map(|(done, notification)| {
        if let Some(payload) = notification {
            notifier.notify_detached(payload);
        }
        done
    });
    action_response(result)
}
