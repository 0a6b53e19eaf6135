use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json,
};
use vitrola_core::{Admission, AdmissionError, Jukebox, Request, RequestId, SubmissionOutcome};

use crate::{
    auth::AdminSession,
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{NewRequestSchema, PaymentEvent, PaymentSchema, ValidatedJson},
    serialized::{AdmissionResult, QueueItem, RequestDetails, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/api/musicas/fila",
    tag = "requests",
    responses(
        (status = 200, body = Vec<QueueItem>)
    )
)]
async fn queue(State(context): State<ServerContext>) -> Json<Vec<QueueItem>> {
    Json(context.jukebox.queue().to_serialized())
}

#[utoipa::path(
    get,
    path = "/api/musicas/{id}",
    tag = "requests",
    params(
        ("id" = u64, Path, description = "The id of the request")
    ),
    responses(
        (status = 200, body = RequestDetails)
    )
)]
async fn request(
    State(context): State<ServerContext>,
    Path(id): Path<u64>,
) -> ServerResult<Json<RequestDetails>> {
    let id = RequestId::from_value(id);
    let request = find(&context.jukebox, id)?;

    Ok(Json(RequestDetails::new(
        &request,
        context.jukebox.position(id),
    )))
}

#[utoipa::path(
    post,
    path = "/api/musicas",
    tag = "requests",
    request_body = NewRequestSchema,
    responses(
        (status = 200, body = AdmissionResult)
    )
)]
async fn submit(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewRequestSchema>,
) -> ServerResult<Json<AdmissionResult>> {
    let submission = context.jukebox.submit(body.into()).await?;
    let request = &submission.request;

    let result = match submission.outcome {
        SubmissionOutcome::AwaitingPayment => AdmissionResult::awaiting_payment(request),
        SubmissionOutcome::Admitted(admission) => AdmissionResult::accepted(admission, request),
        SubmissionOutcome::Rejected(reason) => AdmissionResult::rejected(reason, request),
    };

    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/musicas/{id}/pagamento",
    tag = "requests",
    params(
        ("id" = u64, Path, description = "The id of the request")
    ),
    request_body = PaymentSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = AdmissionResult)
    )
)]
async fn payment(
    _session: AdminSession,
    State(context): State<ServerContext>,
    Path(id): Path<u64>,
    ValidatedJson(body): ValidatedJson<PaymentSchema>,
) -> ServerResult<Json<AdmissionResult>> {
    let id = RequestId::from_value(id);

    let result = match body.status {
        PaymentEvent::Paid => context.jukebox.confirm_payment(id).await,
        PaymentEvent::Cancelled => {
            context.jukebox.cancel_payment(id)?;
            let request = find(&context.jukebox, id)?;

            return Ok(Json(AdmissionResult::cancelled(&request)));
        }
    };

    admission_result(&context.jukebox, id, result)
}

#[utoipa::path(
    post,
    path = "/api/musicas/{id}/aprovar",
    tag = "requests",
    params(
        ("id" = u64, Path, description = "The id of the request")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = AdmissionResult)
    )
)]
async fn approve(
    _session: AdminSession,
    State(context): State<ServerContext>,
    Path(id): Path<u64>,
) -> ServerResult<Json<AdmissionResult>> {
    let id = RequestId::from_value(id);
    let result = context.jukebox.approve(id);

    admission_result(&context.jukebox, id, result)
}

#[utoipa::path(
    delete,
    path = "/api/musicas/{id}",
    tag = "requests",
    params(
        ("id" = u64, Path, description = "The id of the request")
    ),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 204, description = "The request was cancelled")
    )
)]
async fn cancel(
    _session: AdminSession,
    State(context): State<ServerContext>,
    Path(id): Path<u64>,
) -> ServerResult<StatusCode> {
    context.jukebox.cancel_request(RequestId::from_value(id))?;

    Ok(StatusCode::NO_CONTENT)
}

fn find(jukebox: &Jukebox, id: RequestId) -> ServerResult<Request> {
    jukebox.request(id).ok_or(ServerError::NotFound {
        resource: "request",
        identifier: id.to_string(),
    })
}

/// Rejections are a normal outcome, anything else is an error
fn admission_result(
    jukebox: &Jukebox,
    id: RequestId,
    result: Result<Admission, AdmissionError>,
) -> ServerResult<Json<AdmissionResult>> {
    let outcome = match result {
        Ok(admission) => Ok(admission),
        Err(AdmissionError::Rejected(reason)) => Err(reason),
        Err(e) => return Err(e.into()),
    };

    let request = find(jukebox, id)?;

    Ok(Json(match outcome {
        Ok(admission) => AdmissionResult::accepted(admission, &request),
        Err(reason) => AdmissionResult::rejected(reason, &request),
    }))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(submit))
        .route("/fila", get(queue))
        .route("/:id", get(request).delete(cancel))
        .route("/:id/pagamento", post(payment))
        .route("/:id/aprovar", post(approve))
}
