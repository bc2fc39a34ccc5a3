use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::Message;
use tokio::sync::mpsc;

use crate::auth::session::get_user_id;
use crate::realtime::{self, ConnectionMap};

/// GET /ws - WebSocket upgrade. The socket only receives; all writes go
/// through the HTTP routes.
pub async fn ws_connect(
    req: HttpRequest,
    body: web::Payload,
    session: Session,
    conn_map: web::Data<ConnectionMap>,
) -> Result<HttpResponse, actix_web::Error> {
    let Some(member_id) = get_user_id(&session) else {
        return Ok(HttpResponse::Unauthorized().finish());
    };

    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, body)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    realtime::register(&conn_map, member_id, tx);
    log::debug!("Member {member_id} connected ({} open sockets)", realtime::connection_count(&conn_map));

    let conn_map = conn_map.into_inner();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    if ws_session.text(msg).await.is_err() {
                        break;
                    }
                }
                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if ws_session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
                else => break,
            }
        }

        drop(rx);
        realtime::unregister_closed(&conn_map, member_id);
        log::debug!("Member {member_id} disconnected");
    });

    Ok(response)
}
