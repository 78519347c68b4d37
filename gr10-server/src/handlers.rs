use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use gr10_core::{
    collect, normalize_contract, notify_all, render_form, render_report, upsert_response,
    FormRecord,
};

use crate::state::AppState;

/// Name of the session cookie carrying the opaque login token.
pub const SESSION_COOKIE: &str = "gr10_sessao";

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="pt-br">
<head><meta charset="utf-8"><title>Plataforma GR10 - Login</title></head>
<body>
<h1>Plataforma GR10</h1>
<form method="post" action="/login">
  <label>Usuário: <input name="usuario"></label><br>
  <label>Senha: <input name="senha" type="password"></label><br>
  <button type="submit">Entrar</button>
</form>
</body>
</html>
"#;

fn session_user(state: &AppState, jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions().resolve(cookie.value()))
}

/// Every route except login/logout goes through this gate: no valid
/// session cookie means a redirect to the login page.
fn require_login(state: &AppState, jar: &CookieJar) -> Result<String, Redirect> {
    session_user(state, jar).ok_or_else(|| Redirect::to("/login"))
}

pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub usuario: String,
    #[serde(default)]
    pub senha: String,
}

pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if !state.verifier().verify(&form.usuario, &form.senha) {
        return (StatusCode::UNAUTHORIZED, "Usuário ou senha inválidos").into_response();
    }

    let token = state.sessions().open(&form.usuario);
    info!(usuario = %form.usuario, "login");
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build();
    (jar.add(cookie), Redirect::to("/")).into_response()
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions().close(cookie.value());
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/").build());
    (jar, Redirect::to("/login")).into_response()
}

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Response {
    let usuario = match require_login(&state, &jar) {
        Ok(usuario) => usuario,
        Err(redirect) => return redirect.into_response(),
    };
    Json(json!({
        "plataforma": "GR10 A07 - Monitoramento de PLD",
        "usuario": usuario,
    }))
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct ContractForm {
    #[serde(default)]
    pub contrato: String,
}

pub async fn pesquisar(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ContractForm>,
) -> Response {
    if let Err(redirect) = require_login(&state, &jar) {
        return redirect.into_response();
    }

    let contrato = normalize_contract(&form.contrato);
    if contrato.is_empty() {
        return (StatusCode::BAD_REQUEST, "Número do contrato não informado.").into_response();
    }

    if state.store().exists(&contrato) {
        info!(%contrato, "formulário encontrado");
    } else {
        info!(%contrato, "nenhum formulário encontrado");
    }
    Redirect::to(&format!("/formulario?contrato={contrato}")).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ContractQuery {
    #[serde(default)]
    pub contrato: String,
}

pub async fn formulario(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ContractQuery>,
) -> Response {
    if let Err(redirect) = require_login(&state, &jar) {
        return redirect.into_response();
    }

    let contrato = normalize_contract(&query.contrato);
    let dados = match state.store().load(&contrato) {
        Ok(Some(record)) => serde_json::to_value(&record).unwrap_or_else(|_| json!({})),
        Ok(None) => json!({}),
        Err(e) => {
            warn!(%contrato, "failed to load form: {e}");
            json!({})
        }
    };
    Json(json!({ "contrato": contrato, "dados": dados })).into_response()
}

pub async fn salvar_json(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<Value>,
) -> Response {
    if let Err(redirect) = require_login(&state, &jar) {
        return redirect.into_response();
    }

    let Some(fields) = payload.as_object() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "erro": "Formulário inválido." })),
        )
            .into_response();
    };

    let contrato =
        normalize_contract(fields.get("contrato").and_then(Value::as_str).unwrap_or(""));
    if contrato.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "erro": "Número do contrato não informado." })),
        )
            .into_response();
    }

    // The form posts strings; anything else is kept as its JSON text
    let mut record = FormRecord::new();
    for (key, value) in fields {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        record.set(key.clone(), text);
    }
    record.set(FormRecord::CONTRACT, contrato.as_str());

    if let Err(e) = state.store().save(&contrato, &record) {
        error!(%contrato, "failed to save form: {e}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "erro": "Erro ao salvar o formulário." })),
        )
            .into_response();
    }

    // The record file stays the source of truth; a spreadsheet hiccup
    // must not fail the save
    if let Err(e) = upsert_response(&state.config().spreadsheet_path, &record) {
        warn!(%contrato, "spreadsheet update failed: {e:#}");
    }

    Json(json!({
        "status": "ok",
        "mensagem": "Formulário salvo com sucesso!",
        "link_proximo": format!("/formulario?contrato={contrato}"),
    }))
    .into_response()
}

pub async fn visualizar_pdf(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ContractQuery>,
) -> Response {
    if let Err(redirect) = require_login(&state, &jar) {
        return redirect.into_response();
    }

    let contrato = normalize_contract(&query.contrato);
    let record = match state.store().load(&contrato) {
        Ok(Some(record)) => record,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "Dados do formulário não encontrados").into_response()
        }
        Err(e) => {
            error!(%contrato, "failed to load form: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Erro ao carregar dados",
            )
                .into_response();
        }
    };

    match render_form(&contrato, &record) {
        Ok(bytes) => pdf_attachment(bytes, &format!("formulario_{contrato}.pdf")),
        Err(e) => {
            error!(%contrato, "failed to render form PDF: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao gerar o PDF").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    #[serde(default)]
    pub data_inicio: String,
    #[serde(default)]
    pub data_fim: String,
}

pub async fn relatorios(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(range): Query<RangeParams>,
) -> Response {
    if let Err(redirect) = require_login(&state, &jar) {
        return redirect.into_response();
    }

    let dados = if range.data_inicio.is_empty() || range.data_fim.is_empty() {
        Vec::new()
    } else {
        collect(state.store(), &range.data_inicio, &range.data_fim)
    };
    Json(json!({
        "data_inicio": range.data_inicio,
        "data_fim": range.data_fim,
        "dados": dados,
    }))
    .into_response()
}

pub async fn relatorios_pdf(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(range): Form<RangeParams>,
) -> Response {
    if let Err(redirect) = require_login(&state, &jar) {
        return redirect.into_response();
    }

    let rows = collect(state.store(), &range.data_inicio, &range.data_fim);
    match render_report(&rows, &range.data_inicio, &range.data_fim) {
        Ok(bytes) => pdf_attachment(
            bytes,
            &format!("relatorio_{}a{}.pdf", range.data_inicio, range.data_fim),
        ),
        Err(e) => {
            error!("failed to render report PDF: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao gerar o PDF").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NotifyParams {
    #[serde(default)]
    pub email_usuario: String,
    #[serde(default)]
    pub destinatarios: String,
    #[serde(default)]
    pub contrato: String,
    #[serde(default)]
    pub observacao: String,
}

pub async fn enviar_email(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<NotifyParams>,
) -> Response {
    if let Err(redirect) = require_login(&state, &jar) {
        return redirect.into_response();
    }

    let contrato = normalize_contract(&form.contrato);
    if form.email_usuario.trim().is_empty()
        || form.destinatarios.trim().is_empty()
        || contrato.is_empty()
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "erro": "Todos os campos são obrigatórios." })),
        )
            .into_response();
    }

    // Mail submission is the one slow external call; keep it off the
    // async workers
    let task_state = state.clone();
    let sent = tokio::task::spawn_blocking(move || {
        notify_all(
            task_state.mailer(),
            &task_state.config().form_link_base,
            &form.destinatarios,
            &contrato,
            &form.email_usuario,
            &form.observacao,
        )
    })
    .await;

    match sent {
        Ok(Ok(count)) => Json(json!({
            "status": "ok",
            "mensagem": format!("E-mails enviados com sucesso! ({count} destinatário(s))"),
        }))
        .into_response(),
        Ok(Err(e)) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "erro": format!("Erro ao enviar e-mails: {e:#}") })),
        )
            .into_response(),
        Err(e) => {
            error!("notification task failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "erro": "Erro ao enviar e-mails." })),
            )
                .into_response()
        }
    }
}

fn pdf_attachment(bytes: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gr10_core::{AppConfig, Mailer, StaticCredentials};
    use std::collections::HashMap;
    use tempfile::tempdir;

    struct NullMailer;

    impl Mailer for NullMailer {
        fn send(&self, _recipient: &str, _subject: &str, _body: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn test_state(dir: &std::path::Path) -> AppState {
        let mut config = AppConfig::default();
        config.data_dir = dir.join("dados");
        config.spreadsheet_path = dir.join("respostas.xlsx");

        let mut users = HashMap::new();
        users.insert("ana.ferrari".to_string(), "segredo".to_string());

        AppState::new(
            config,
            Box::new(StaticCredentials::new(users)),
            Box::new(NullMailer),
        )
    }

    fn logged_in_jar(state: &AppState) -> CookieJar {
        let token = state.sessions().open("ana.ferrari");
        CookieJar::new().add(Cookie::new(SESSION_COOKIE, token))
    }

    #[tokio::test]
    async fn test_login_success_sets_cookie_and_redirects() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());

        let response = login_submit(
            State(state),
            CookieJar::new(),
            Form(LoginForm {
                usuario: "ana.ferrari".to_string(),
                senha: "segredo".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(response.headers().contains_key(header::SET_COOKIE));
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/"
        );
    }

    #[tokio::test]
    async fn test_login_failure_is_unauthorized() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());

        let response = login_submit(
            State(state),
            CookieJar::new(),
            Form(LoginForm {
                usuario: "ana.ferrari".to_string(),
                senha: "errada".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_gated_route_redirects_to_login() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());

        let response = index(State(state), CookieJar::new()).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login"
        );
    }

    #[tokio::test]
    async fn test_salvar_json_normalizes_and_persists() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        let jar = logged_in_jar(&state);

        let response = salvar_json(
            State(state.clone()),
            jar,
            Json(json!({
                "contrato": " 99-9 ",
                "nome_gestor_relacionamento": "Maria Souza",
                "data_apontamento": "2024-01-10",
            })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let stored = state.store().load("999").unwrap().expect("form persisted");
        assert_eq!(stored.value(FormRecord::CONTRACT), "999");
        assert_eq!(stored.value(FormRecord::MANAGER_NAME), "Maria Souza");
    }

    #[tokio::test]
    async fn test_salvar_json_rejects_missing_contract() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        let jar = logged_in_jar(&state);

        let response = salvar_json(
            State(state),
            jar,
            Json(json!({ "contrato": "sem numero" })),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_pesquisar_rejects_empty_contract() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        let jar = logged_in_jar(&state);

        let response = pesquisar(
            State(state),
            jar,
            Form(ContractForm {
                contrato: "   ".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_visualizar_pdf_missing_form_is_not_found() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        let jar = logged_in_jar(&state);

        let response = visualizar_pdf(
            State(state),
            jar,
            Query(ContractQuery {
                contrato: "404404".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_enviar_email_requires_all_fields() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        let jar = logged_in_jar(&state);

        let response = enviar_email(
            State(state),
            jar,
            Form(NotifyParams {
                email_usuario: "Ana".to_string(),
                destinatarios: String::new(),
                contrato: "123".to_string(),
                observacao: String::new(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_enviar_email_fans_out() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        let jar = logged_in_jar(&state);

        let response = enviar_email(
            State(state),
            jar,
            Form(NotifyParams {
                email_usuario: "Ana".to_string(),
                destinatarios: "a@x.com; b@y.com".to_string(),
                contrato: "123".to_string(),
                observacao: "Urgente".to_string(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let dir = tempdir().unwrap();
        let state = test_state(dir.path());
        let token = state.sessions().open("ana.ferrari");
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, token.clone()));

        let response = logout(State(state.clone()), jar).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(state.sessions().resolve(&token), None);
    }
}
