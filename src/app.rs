use leptos::ev::SubmitEvent;
use leptos::logging::log;
use leptos::prelude::*;
use leptos::server_fn::codec::Json;
use leptos::server_fn::error::NoCustomError;
use leptos::task::spawn_local;
use leptos_meta::{provide_meta_context, MetaTags, Stylesheet, Title};
use leptos_router::{
    components::{Route, Router, Routes},
    hooks::{use_navigate, use_query_map},
    path, NavigateOptions,
};

use crate::invite_link;
use crate::model::{
    DiningTable, GuestForm, GuestKind, Invite, InviteDetails, InviteForm, InviteWithGuests, Rsvp,
    RsvpSubmission, RsvpView, TicketInfo,
};
use crate::search::{GroupStats, GuestEntry};
use crate::seating::{
    build_seating_chart, short_table_name, unassigned_rsvps, DashboardStats, TableOccupancy,
};
use crate::share::{invite_message, ticket_message, whatsapp_share_url};

#[cfg(feature = "ssr")]
use crate::config::AppConfig;
#[cfg(feature = "ssr")]
use crate::error::RsvpError;
#[cfg(feature = "ssr")]
use crate::ticket::{issue_ticket, TicketStore};
#[cfg(feature = "ssr")]
use crate::{
    assign_rsvp_to_table, create_admin_session, create_invite, create_table,
    delete_admin_session, delete_invite, delete_table, get_all_invites_with_guests,
    get_all_rsvps, get_all_tables, get_invite_by_token, guest_groups, run_db, submit_rsvp,
    unassign_rsvp, update_invite, update_table_capacity, validate_admin_token, DbPool,
};
#[cfg(feature = "ssr")]
use diesel::SqliteConnection;

#[cfg(feature = "ssr")]
const ADMIN_COOKIE: &str = "admin_token";
const FLASH_MS: u32 = 3500;

#[cfg(feature = "ssr")]
fn server_error(e: impl std::fmt::Display) -> ServerFnError<NoCustomError> {
    ServerFnError::ServerError(e.to_string())
}

#[cfg(feature = "ssr")]
fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

// Runs a database call on the blocking pool using the pool provided to the server functions.
#[cfg(feature = "ssr")]
async fn with_conn<T, F>(f: F) -> Result<T, ServerFnError<NoCustomError>>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, RsvpError> + Send + 'static,
    T: Send + 'static,
{
    let pool: DbPool = expect_context();
    run_db(&pool, f).await.map_err(server_error)
}

/// Finds `name` in a `Cookie` header.
#[cfg(feature = "ssr")]
fn cookie_value(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    let cookie_str = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    cookie_str.split(';').find_map(|cookie| {
        cookie
            .trim()
            .strip_prefix(name)
            .and_then(|rest| rest.strip_prefix('='))
            .map(str::to_string)
    })
}

#[cfg(feature = "ssr")]
async fn admin_token_from_request() -> Result<Option<String>, ServerFnError<NoCustomError>> {
    use axum::http::HeaderMap;
    use leptos_axum::extract;

    let headers: HeaderMap = extract().await.map_err(server_error)?;
    Ok(cookie_value(&headers, ADMIN_COOKIE))
}

// Returns an empty result if the current request is from an admin, or an error otherwise.
#[cfg(feature = "ssr")]
async fn check_admin() -> Result<(), ServerFnError<NoCustomError>> {
    if is_admin().await? {
        Ok(())
    } else {
        Err(ServerFnError::ServerError("Unauthorized".to_string()))
    }
}

#[cfg(feature = "ssr")]
fn set_admin_cookie(value: &str, max_age: i64) -> Result<(), ServerFnError<NoCustomError>> {
    use leptos_axum::ResponseOptions;
    let resp: ResponseOptions = expect_context();
    let cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Strict",
        ADMIN_COOKIE, value, max_age
    );
    resp.insert_header(
        axum::http::header::SET_COOKIE,
        axum::http::HeaderValue::from_str(&cookie).map_err(server_error)?,
    );
    Ok(())
}

#[server(LoadInvite)]
pub async fn load_invite(token: String) -> Result<InviteDetails, ServerFnError<NoCustomError>> {
    let now = now();
    with_conn(move |conn| get_invite_by_token(conn, &token, now)).await
}

#[server(name = SendRsvp, input = Json)]
pub async fn send_rsvp(submission: RsvpSubmission) -> Result<Rsvp, ServerFnError<NoCustomError>> {
    let now = now();
    let rsvp = with_conn(move |conn| submit_rsvp(conn, &submission, now)).await?;
    tracing::info!(rsvp_id = rsvp.id, attending = rsvp.attending, "rsvp recorded");
    Ok(rsvp)
}

#[server(GenerateTicket)]
pub async fn generate_ticket(token: String) -> Result<TicketInfo, ServerFnError<NoCustomError>> {
    let config: AppConfig = expect_context();
    let store = TicketStore::from_config(&config);
    let base_url = config.public_base_url.clone();
    let now = now();
    with_conn(move |conn| issue_ticket(conn, &store, &token, &base_url, now)).await
}

// Checks if the current request is from an admin. Returns true if it is, false otherwise.
#[server(IsAdmin)]
pub async fn is_admin() -> Result<bool, ServerFnError<NoCustomError>> {
    let Some(token) = admin_token_from_request().await? else {
        return Ok(false);
    };
    let now = now();
    with_conn(move |conn| validate_admin_token(conn, &token, now)).await
}

#[server(AdminLogin)]
pub async fn admin_login(password: String) -> Result<(), ServerFnError<NoCustomError>> {
    let config: AppConfig = expect_context();
    if password != config.admin_password {
        tracing::warn!("rejected admin login");
        return Err(ServerFnError::ServerError("Invalid password".to_string()));
    }

    let now = now();
    let token = with_conn(move |conn| create_admin_session(conn, now)).await?;
    set_admin_cookie(&token, 86400)?;
    tracing::info!("admin signed in");
    Ok(())
}

#[server(AdminLogout)]
pub async fn admin_logout() -> Result<(), ServerFnError<NoCustomError>> {
    if let Some(token) = admin_token_from_request().await? {
        with_conn(move |conn| delete_admin_session(conn, &token)).await?;
    }
    set_admin_cookie("", 0)
}

#[server(PublicBaseUrl)]
pub async fn public_base_url() -> Result<String, ServerFnError<NoCustomError>> {
    let config: AppConfig = expect_context();
    Ok(config.public_base_url)
}

#[server(ListInvites)]
pub async fn list_invites() -> Result<Vec<InviteWithGuests>, ServerFnError<NoCustomError>> {
    check_admin().await?;
    with_conn(get_all_invites_with_guests).await
}

/// Creates an invite when `invite_id` is `None`, otherwise updates it.
#[server(name = SaveInvite, input = Json)]
pub async fn save_invite(
    invite_id: Option<i32>,
    form: InviteForm,
) -> Result<Invite, ServerFnError<NoCustomError>> {
    check_admin().await?;
    let config: AppConfig = expect_context();
    let invite = match invite_id {
        Some(id) => with_conn(move |conn| update_invite(conn, id, &form)).await?,
        None => {
            let expires_at = now() + config.invite_validity();
            let event = config.event_name.clone();
            with_conn(move |conn| create_invite(conn, &form, &event, Some(expires_at))).await?
        }
    };
    tracing::info!(invite_id = invite.id, label = %invite.label, "invite saved");
    Ok(invite)
}

#[server(DeleteInvite)]
pub async fn delete_invite_handler(invite_id: i32) -> Result<(), ServerFnError<NoCustomError>> {
    check_admin().await?;
    let deleted = with_conn(move |conn| delete_invite(conn, invite_id)).await?;
    tracing::info!(invite_id, deleted, "invite deleted");
    Ok(())
}

#[server(ListRsvps)]
pub async fn list_rsvps() -> Result<Vec<RsvpView>, ServerFnError<NoCustomError>> {
    check_admin().await?;
    with_conn(get_all_rsvps).await
}

#[server(ListTables)]
pub async fn list_tables() -> Result<Vec<DiningTable>, ServerFnError<NoCustomError>> {
    check_admin().await?;
    with_conn(get_all_tables).await
}

#[server(CreateTable)]
pub async fn create_table_handler(
    name: String,
    capacity: Option<i32>,
) -> Result<DiningTable, ServerFnError<NoCustomError>> {
    check_admin().await?;
    let config: AppConfig = expect_context();
    let capacity = capacity.unwrap_or(config.default_table_capacity);
    with_conn(move |conn| create_table(conn, &name, capacity)).await
}

#[server(UpdateTableCapacity)]
pub async fn update_table_capacity_handler(
    table_id: i32,
    capacity: i32,
) -> Result<DiningTable, ServerFnError<NoCustomError>> {
    check_admin().await?;
    with_conn(move |conn| update_table_capacity(conn, table_id, capacity)).await
}

#[server(DeleteTable)]
pub async fn delete_table_handler(table_id: i32) -> Result<(), ServerFnError<NoCustomError>> {
    check_admin().await?;
    with_conn(move |conn| delete_table(conn, table_id)).await
}

#[server(AssignTable)]
pub async fn assign_table_handler(
    rsvp_id: i32,
    table_name: String,
) -> Result<Rsvp, ServerFnError<NoCustomError>> {
    check_admin().await?;
    let rsvp = with_conn(move |conn| assign_rsvp_to_table(conn, rsvp_id, &table_name)).await?;
    tracing::debug!(rsvp_id, table = ?rsvp.table_assignment, "rsvp seated");
    Ok(rsvp)
}

#[server(UnassignTable)]
pub async fn unassign_table_handler(rsvp_id: i32) -> Result<Rsvp, ServerFnError<NoCustomError>> {
    check_admin().await?;
    with_conn(move |conn| unassign_rsvp(conn, rsvp_id)).await
}

#[server(SearchGuests)]
pub async fn search_guests_handler(
    term: String,
) -> Result<Vec<GuestEntry>, ServerFnError<NoCustomError>> {
    check_admin().await?;
    let invites = with_conn(get_all_invites_with_guests).await?;
    Ok(crate::search::search_guests(&term, &guest_groups(&invites)))
}

#[server(GetStats)]
pub async fn get_stats() -> Result<(DashboardStats, GroupStats), ServerFnError<NoCustomError>> {
    check_admin().await?;
    let (invites, rsvps) = with_conn(|conn| {
        let invites = get_all_invites_with_guests(conn)?;
        let rsvps = get_all_rsvps(conn)?;
        Ok((invites, rsvps))
    })
    .await?;
    let plain: Vec<Invite> = invites.iter().map(|i| i.invite.clone()).collect();
    Ok((
        crate::seating::dashboard_stats(&plain, &rsvps),
        crate::search::group_stats(&guest_groups(&invites)),
    ))
}

// The message behind a server function error, without the framework's prefix.
fn error_message(e: &ServerFnError<NoCustomError>) -> String {
    match e {
        ServerFnError::ServerError(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// One guest per line. A leading `+` marks a companion.
fn parse_guest_lines(text: &str) -> Vec<GuestForm> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.strip_prefix('+') {
            Some(name) => GuestForm {
                name: name.trim().to_string(),
                kind: GuestKind::Companion,
            },
            None => GuestForm {
                name: line.to_string(),
                kind: GuestKind::Principal,
            },
        })
        .filter(|guest| !guest.name.is_empty())
        .collect()
}

fn guest_lines(entry: &InviteWithGuests) -> String {
    entry
        .guests
        .iter()
        .map(|g| {
            if g.kind == GuestKind::Companion.as_str() {
                format!("+{}", g.name)
            } else {
                g.name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq)]
struct Flash {
    ok: bool,
    text: String,
}

// Shows a message for a few seconds.
fn show_flash(flash: RwSignal<Option<Flash>>, ok: bool, text: impl Into<String>) {
    let shown = Flash {
        ok,
        text: text.into(),
    };
    flash.set(Some(shown.clone()));
    #[cfg(feature = "hydrate")]
    spawn_local(async move {
        gloo_timers::future::TimeoutFuture::new(FLASH_MS).await;
        // A newer message keeps its own timer.
        if flash.get_untracked().as_ref() == Some(&shown) {
            flash.set(None);
        }
    });
    #[cfg(not(feature = "hydrate"))]
    let _ = (shown, FLASH_MS);
}

fn copy_to_clipboard(text: String, flash: RwSignal<Option<Flash>>) {
    #[cfg(feature = "hydrate")]
    {
        let Some(window) = web_sys::window() else {
            return;
        };
        let promise = window.navigator().clipboard().write_text(&text);
        spawn_local(async move {
            match wasm_bindgen_futures::JsFuture::from(promise).await {
                Ok(_) => show_flash(flash, true, "Invite link copied."),
                Err(e) => {
                    log!("Clipboard error: {:?}", e);
                    show_flash(flash, false, format!("Copy this link: {}", text));
                }
            }
        });
    }
    #[cfg(not(feature = "hydrate"))]
    let _ = (text, flash);
}

#[component]
fn FlashMessage(flash: RwSignal<Option<Flash>>) -> impl IntoView {
    move || {
        flash.get().map(|f| {
            let class = if f.ok { "flash flash-ok" } else { "flash flash-error" };
            view! { <div class=class role="status">{f.text}</div> }
        })
    }
}

const SW_REGISTER: &str = "if ('serviceWorker' in navigator) { \
    window.addEventListener('load', function () { navigator.serviceWorker.register('/sw.js'); }); }";

pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <meta name="theme-color" content="#8a6d4b" />
                <link rel="manifest" href="/manifest.json" />
                <AutoReload options=options.clone() />
                <HydrationScripts options />
                <MetaTags />
                <script inner_html=SW_REGISTER></script>
            </head>
            <body>
                <App />
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    // Provides context that manages stylesheets, titles, meta tags, etc.
    provide_meta_context();

    view! {
        // id=leptos means cargo-leptos will hot-reload this stylesheet
        <Stylesheet id="leptos" href="/pkg/wedding-rsvp.css" />

        <Title text="Wedding RSVP" />

        <Router>
            <main>
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=path!("/") view=Home />
                    <Route path=path!("/rsvp") view=RsvpPage />
                    <Route path=path!("/admin/login") view=AdminLogin />
                    <Route path=path!("/admin") view=AdminDashboard />
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn Home() -> impl IntoView {
    let is_admin_res = Resource::new(|| (), |_| is_admin());

    view! {
        <div class="home">
            <h1>"We're getting married!"</h1>
            <p>"Open the link on your invite to let us know if you can make it."</p>
            <Suspense>
                {move || {
                    is_admin_res
                        .with(|admin| match admin {
                            Some(Ok(true)) => {
                                view! {
                                    <p>
                                        <a href="/admin">"Admin Dashboard"</a>
                                    </p>
                                }
                                    .into_any()
                            }
                            _ => view! {}.into_any(),
                        })
                }}
            </Suspense>
        </div>
    }
}

#[component]
fn RsvpPage() -> impl IntoView {
    let query = use_query_map();
    let token = move || query.read().get("token").unwrap_or_default();
    let invite = Resource::new(token, load_invite);

    view! {
        <div class="rsvp-page">
            <Suspense fallback=|| {
                view! { <p>"Loading your invite..."</p> }
            }>
                {move || {
                    invite
                        .get()
                        .map(|result| match result {
                            Ok(details) => view! { <RsvpForm details token=token() /> }.into_any(),
                            Err(e) => {
                                view! {
                                    <div class="invite-error">
                                        <h1>"Invite unavailable"</h1>
                                        <p>{error_message(&e)}</p>
                                    </div>
                                }
                                    .into_any()
                            }
                        })
                }}
            </Suspense>
        </div>
    }
}

#[component]
fn RsvpForm(details: InviteDetails, token: String) -> impl IntoView {
    let invite_id = details.invite_id;
    let max_guests = details.max_guests;
    let first_name = details
        .guests
        .first()
        .map(|g| g.name.clone())
        .unwrap_or_default();

    let guest_name = RwSignal::new(first_name);
    let attending = RwSignal::new(None::<bool>);
    let guests_count = RwSignal::new(1i64);
    let phone = RwSignal::new(String::new());
    let message = RwSignal::new(String::new());
    let error = RwSignal::new(String::new());
    let saved = RwSignal::new(None::<Rsvp>);
    let ticket = RwSignal::new(None::<TicketInfo>);
    let token = StoredValue::new(token);

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let Some(answer) = attending.get() else {
            error.set("Let us know whether you can come.".to_string());
            return;
        };
        if guest_name.get().trim().is_empty() {
            error.set("Please tell us your name.".to_string());
            return;
        }
        let submission = RsvpSubmission {
            invite_id: Some(invite_id),
            guest_name: Some(guest_name.get()),
            attending: Some(answer),
            guests_count: Some(guests_count.get()),
            phone: Some(phone.get()),
            message: Some(message.get()),
        };
        spawn_local(async move {
            match send_rsvp(submission).await {
                Ok(rsvp) => {
                    error.set(String::new());
                    saved.set(Some(rsvp));
                }
                Err(e) => error.set(error_message(&e)),
            }
        });
    };

    let fetch_ticket = move |_| {
        spawn_local(async move {
            match generate_ticket(token.get_value()).await {
                Ok(info) => ticket.set(Some(info)),
                Err(e) => {
                    log!("Ticket error: {}", e);
                    error.set(error_message(&e));
                }
            }
        });
    };

    let guest_options = details
        .guests
        .iter()
        .map(|g| view! { <option value=g.name.clone()></option> })
        .collect_view();

    view! {
        <div class="rsvp-card">
            <p class="event">{details.event.clone()}</p>
            <h1>{details.label.clone()}</h1>
            <p class="invite-size">
                {if max_guests == 1 {
                    "This invite is for one person.".to_string()
                } else {
                    format!("This invite is for up to {} people.", max_guests)
                }}
                {details.allow_plus_one.then_some(" You're welcome to bring a companion.")}
            </p>
            {move || match saved.get() {
                Some(rsvp) if rsvp.attending => {
                    view! {
                        <div class="rsvp-done">
                            <h2>"See you there, " {rsvp.guest_name.clone()} "!"</h2>
                            <p>{format!("We saved {} seat(s) for you.", rsvp.guests_count)}</p>
                            {move || match ticket.get() {
                                Some(info) => {
                                    view! {
                                        <p>
                                            <a href=info.url.clone() download=info.download_name.clone()>
                                                "Download your ticket"
                                            </a>
                                            " · "
                                            <a
                                                href=whatsapp_share_url(&ticket_message(&info.url))
                                                target="_blank"
                                                rel="noopener"
                                            >
                                                "Share on WhatsApp"
                                            </a>
                                            " · Table: "
                                            {info.table_name.clone()}
                                        </p>
                                    }
                                        .into_any()
                                }
                                None => {
                                    view! {
                                        <button class="btn-primary" on:click=fetch_ticket>
                                            "Get my ticket"
                                        </button>
                                    }
                                        .into_any()
                                }
                            }}
                            <button class="btn-secondary" on:click=move |_| saved.set(None)>
                                "Change my answer"
                            </button>
                        </div>
                    }
                        .into_any()
                }
                Some(_) => {
                    view! {
                        <div class="rsvp-done">
                            <h2>"We'll miss you!"</h2>
                            <p>"Thanks for letting us know."</p>
                            <button class="btn-secondary" on:click=move |_| saved.set(None)>
                                "Change my answer"
                            </button>
                        </div>
                    }
                        .into_any()
                }
                None => view! {}.into_any(),
            }}
            <form class="rsvp-form" on:submit=submit hidden=move || saved.get().is_some()>
                <div class="form-group">
                    <label>
                        "Your name: "
                        <input
                            class="form-input"
                            type="text"
                            list="invite-guests"
                            prop:value=move || guest_name.get()
                            on:input=move |ev| guest_name.set(event_target_value(&ev))
                        />
                    </label>
                    <datalist id="invite-guests">{guest_options}</datalist>
                </div>
                <div class="form-group attendance">
                    <label>
                        <input
                            type="radio"
                            name="attending"
                            prop:checked=move || attending.get() == Some(true)
                            on:change=move |_| attending.set(Some(true))
                        />
                        "Joyfully accept"
                    </label>
                    <label>
                        <input
                            type="radio"
                            name="attending"
                            prop:checked=move || attending.get() == Some(false)
                            on:change=move |_| attending.set(Some(false))
                        />
                        "Regretfully decline"
                    </label>
                </div>
                <Show when=move || attending.get() == Some(true)>
                    <div class="form-group">
                        <label>
                            "Number of guests: "
                            <input
                                class="form-input"
                                type="number"
                                min="1"
                                max=max_guests.to_string()
                                prop:value=move || guests_count.get().to_string()
                                on:input=move |ev| {
                                    if let Ok(value) = event_target_value(&ev).parse::<i64>() {
                                        guests_count.set(value);
                                    }
                                }
                            />
                        </label>
                    </div>
                </Show>
                <div class="form-group">
                    <label>
                        "Phone: "
                        <input
                            class="form-input"
                            type="tel"
                            prop:value=move || phone.get()
                            on:input=move |ev| phone.set(event_target_value(&ev))
                        />
                    </label>
                </div>
                <div class="form-group">
                    <label>
                        "Message for the couple: "
                        <textarea
                            class="form-input"
                            prop:value=move || message.get()
                            on:input=move |ev| message.set(event_target_value(&ev))
                        ></textarea>
                    </label>
                </div>
                <button type="submit" class="btn-primary">
                    "Send RSVP"
                </button>
            </form>
            {move || (!error.get().is_empty()).then(|| view! { <p class="error">{error.get()}</p> })}
        </div>
    }
}

#[component]
fn AdminLogin() -> impl IntoView {
    let password = RwSignal::new(String::new());
    let error = RwSignal::new(String::new());

    let submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let p = password.get();
        if p.is_empty() {
            error.set("Please enter password.".to_string());
            return;
        }
        spawn_local(async move {
            match admin_login(p).await {
                Ok(_) => {
                    error.set(String::new());
                    let navigate = use_navigate();
                    navigate("/admin", NavigateOptions::default());
                }
                Err(e) => error.set(error_message(&e)),
            }
        });
    };

    view! {
        <div class="admin-login">
            <h1>"Admin Login"</h1>
            <form on:submit=submit>
                <label>
                    "Password: "
                    <input
                        type="password"
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                </label>
                <button type="submit" class="btn-primary">"Login"</button>
            </form>
            {move || (!error.get().is_empty()).then(|| view! { <p class="error">{error.get()}</p> })}
        </div>
    }
}

#[component]
fn AdminDashboard() -> impl IntoView {
    // Fetchers for the dashboard state.
    let is_admin_fetcher = Resource::new(|| (), |_| is_admin());
    let invites_fetcher = Resource::new(|| (), |_| list_invites());
    let rsvps_fetcher = Resource::new(|| (), |_| list_rsvps());
    let tables_fetcher = Resource::new(|| (), |_| list_tables());
    let stats_fetcher = Resource::new(|| (), |_| get_stats());
    let base_url_fetcher = Resource::new(|| (), |_| public_base_url());

    let flash = RwSignal::new(None::<Flash>);

    // Redirects to the login page once we know the visitor isn't an admin.
    let navigate = use_navigate();
    Effect::new(move || {
        is_admin_fetcher.with(|maybe_result| {
            if let Some(Ok(false)) = maybe_result {
                navigate("/admin/login", NavigateOptions::default());
            }
        });
    });

    let refresh = move || {
        invites_fetcher.refetch();
        rsvps_fetcher.refetch();
        tables_fetcher.refetch();
        stats_fetcher.refetch();
    };

    // Invite form. `editing` holds the id of the invite being edited.
    let editing = RwSignal::new(None::<i32>);
    let invite_label = RwSignal::new(String::new());
    let invite_max = RwSignal::new(1i32);
    let invite_plus_one = RwSignal::new(false);
    let invite_guests = RwSignal::new(String::new());

    let reset_invite_form = move || {
        editing.set(None);
        invite_label.set(String::new());
        invite_max.set(1);
        invite_plus_one.set(false);
        invite_guests.set(String::new());
    };

    let invite_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let form = InviteForm {
            label: invite_label.get(),
            max_guests: invite_max.get(),
            allow_plus_one: invite_plus_one.get(),
            guests: parse_guest_lines(&invite_guests.get()),
        };
        let invite_id = editing.get();
        spawn_local(async move {
            match save_invite(invite_id, form).await {
                Ok(invite) => {
                    show_flash(flash, true, format!("Saved invite {}.", invite.label));
                    reset_invite_form();
                    refresh();
                }
                Err(e) => show_flash(flash, false, error_message(&e)),
            }
        });
    };

    let edit_invite = move |entry: InviteWithGuests| {
        editing.set(Some(entry.invite.id));
        invite_label.set(entry.invite.label.clone());
        invite_max.set(entry.invite.max_guests);
        invite_plus_one.set(entry.invite.allow_plus_one);
        invite_guests.set(guest_lines(&entry));
    };

    let remove_invite = move |invite_id: i32, label: String| {
        let confirmed = leptos::leptos_dom::helpers::window()
            .confirm_with_message(&format!("Delete the invite for {}?", label))
            .unwrap_or(false);
        if !confirmed {
            return;
        }
        spawn_local(async move {
            match delete_invite_handler(invite_id).await {
                Ok(_) => {
                    show_flash(flash, true, "Invite deleted.");
                    refresh();
                }
                Err(e) => show_flash(flash, false, error_message(&e)),
            }
        });
    };

    let copy_link = move |token: String| {
        let base = base_url_fetcher
            .get()
            .and_then(Result::ok)
            .unwrap_or_default();
        copy_to_clipboard(invite_link(&base, &token), flash);
    };

    let whatsapp_link = move |entry: &InviteWithGuests| {
        let base = base_url_fetcher
            .get()
            .and_then(Result::ok)
            .unwrap_or_default();
        let names: Vec<String> = entry.guests.iter().map(|g| g.name.clone()).collect();
        let link = invite_link(&base, &entry.invite.token);
        whatsapp_share_url(&invite_message(&names, &entry.invite.label, &link))
    };

    // Guest search.
    let search_term = RwSignal::new(String::new());
    let search_results = Resource::new(move || search_term.get(), search_guests_handler);

    // Tables.
    let table_name = RwSignal::new(String::new());
    let table_capacity = RwSignal::new(String::new());

    let table_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let name = table_name.get();
        let capacity = table_capacity.get().trim().parse::<i32>().ok();
        spawn_local(async move {
            match create_table_handler(name, capacity).await {
                Ok(table) => {
                    show_flash(flash, true, format!("Added {}.", table.name));
                    table_name.set(String::new());
                    table_capacity.set(String::new());
                    tables_fetcher.refetch();
                }
                Err(e) => show_flash(flash, false, error_message(&e)),
            }
        });
    };

    let set_capacity = move |table_id: i32, capacity: i32| {
        spawn_local(async move {
            match update_table_capacity_handler(table_id, capacity).await {
                Ok(_) => tables_fetcher.refetch(),
                Err(e) => {
                    show_flash(flash, false, error_message(&e));
                    tables_fetcher.refetch();
                }
            }
        });
    };

    let remove_table = move |table_id: i32| {
        spawn_local(async move {
            match delete_table_handler(table_id).await {
                Ok(_) => {
                    show_flash(flash, true, "Table deleted.");
                    tables_fetcher.refetch();
                }
                Err(e) => show_flash(flash, false, error_message(&e)),
            }
        });
    };

    // Seating: pick an unseated party, then click a table.
    let selected_rsvp = RwSignal::new(None::<i32>);

    let seat = move |rsvp_id: i32, table: String| {
        spawn_local(async move {
            match assign_table_handler(rsvp_id, table).await {
                Ok(_) => {
                    selected_rsvp.set(None);
                    rsvps_fetcher.refetch();
                }
                Err(e) => show_flash(flash, false, error_message(&e)),
            }
        });
    };

    let unseat = move |rsvp_id: i32| {
        spawn_local(async move {
            match unassign_table_handler(rsvp_id).await {
                Ok(_) => rsvps_fetcher.refetch(),
                Err(e) => show_flash(flash, false, error_message(&e)),
            }
        });
    };

    let logout = move |_| {
        spawn_local(async move {
            let _ = admin_logout().await;
            let navigate = use_navigate();
            navigate("/", NavigateOptions::default());
        });
    };

    let seating = move || match (tables_fetcher.get(), rsvps_fetcher.get()) {
        (Some(Ok(tables)), Some(Ok(rsvps))) => {
            Some((build_seating_chart(&tables, &rsvps), unassigned_rsvps(&rsvps)))
        }
        _ => None,
    };

    view! {
        <Suspense fallback=|| {
            "Loading..."
        }>
            {move || {
                if let Some(Ok(true)) = is_admin_fetcher.get() {
                    view! {
                        <div class="admin-container">
                            <header class="admin-header">
                                <h1>"Wedding Dashboard"</h1>
                                <button class="btn-logout" on:click=logout>
                                    "Logout"
                                </button>
                            </header>
                            <FlashMessage flash />

                            <section class="admin-section stats">
                                <h2>"Overview"</h2>
                                <Suspense fallback=|| view! { <p>"Loading..."</p> }>
                                    {move || {
                                        stats_fetcher
                                            .get()
                                            .map(|result| match result {
                                                Ok((stats, groups)) => {
                                                    view! {
                                                        <ul class="stat-cards">
                                                            <li>
                                                                <strong>{stats.total_invites}</strong>
                                                                " invites"
                                                            </li>
                                                            <li>
                                                                <strong>{stats.total_guests_listed}</strong>
                                                                " guests listed"
                                                            </li>
                                                            <li>
                                                                <strong>{stats.confirmed_guests}</strong>
                                                                " confirmed"
                                                            </li>
                                                            <li>
                                                                <strong>{stats.declined}</strong>
                                                                " declined"
                                                            </li>
                                                            <li>
                                                                <strong>{stats.pending_invites}</strong>
                                                                " awaiting an answer"
                                                            </li>
                                                            <li>
                                                                <strong>{groups.average_per_group}</strong>
                                                                " names per invite"
                                                            </li>
                                                        </ul>
                                                    }
                                                        .into_any()
                                                }
                                                Err(e) => {
                                                    view! { <p class="error">{error_message(&e)}</p> }.into_any()
                                                }
                                            })
                                    }}
                                </Suspense>
                            </section>

                            <section class="admin-section">
                                <h2>
                                    {move || {
                                        if editing.get().is_some() { "Edit Invite" } else { "New Invite" }
                                    }}
                                </h2>
                                <form class="admin-form" on:submit=invite_submit>
                                    <div class="form-group">
                                        <label>
                                            "Label: "
                                            <input
                                                class="form-input"
                                                type="text"
                                                placeholder="The Silva family"
                                                prop:value=move || invite_label.get()
                                                on:input=move |ev| invite_label.set(event_target_value(&ev))
                                            />
                                        </label>
                                    </div>
                                    <div class="form-group">
                                        <label>
                                            "Max guests: "
                                            <input
                                                class="form-input"
                                                type="number"
                                                min="1"
                                                prop:value=move || invite_max.get().to_string()
                                                on:input=move |ev| {
                                                    if let Ok(value) = event_target_value(&ev).parse::<i32>() {
                                                        invite_max.set(value);
                                                    }
                                                }
                                            />
                                        </label>
                                    </div>
                                    <div class="form-group">
                                        <label>
                                            <input
                                                type="checkbox"
                                                prop:checked=move || invite_plus_one.get()
                                                on:change=move |ev| invite_plus_one.set(event_target_checked(&ev))
                                            />
                                            " Allow a plus one"
                                        </label>
                                    </div>
                                    <div class="form-group">
                                        <label>
                                            "Guests (one per line, prefix companions with +): "
                                            <textarea
                                                class="form-input"
                                                rows="4"
                                                prop:value=move || invite_guests.get()
                                                on:input=move |ev| invite_guests.set(event_target_value(&ev))
                                            ></textarea>
                                        </label>
                                    </div>
                                    <button type="submit" class="btn-primary">
                                        "Save Invite"
                                    </button>
                                    <Show when=move || editing.get().is_some()>
                                        <button
                                            type="button"
                                            class="btn-secondary"
                                            on:click=move |_| reset_invite_form()
                                        >
                                            "Cancel"
                                        </button>
                                    </Show>
                                </form>
                            </section>

                            <section class="admin-section">
                                <h2>"Invites"</h2>
                                <div class="table-responsive">
                                    <table class="admin-table">
                                        <tbody>
                                            <tr>
                                                <th>"Label"</th>
                                                <th>"Token"</th>
                                                <th>"Guests"</th>
                                                <th>"Max"</th>
                                                <th>"Answered"</th>
                                                <th>"Actions"</th>
                                            </tr>
                                            <Suspense fallback=|| {
                                                view! {
                                                    <tr>
                                                        <td colspan="6">"Loading..."</td>
                                                    </tr>
                                                }
                                            }>
                                                {move || {
                                                    invites_fetcher
                                                        .get()
                                                        .map(|result| match result {
                                                            Ok(invites) if invites.is_empty() => {
                                                                view! {
                                                                    <tr>
                                                                        <td colspan="6">"No invites yet"</td>
                                                                    </tr>
                                                                }
                                                                    .into_any()
                                                            }
                                                            Ok(invites) => {
                                                                invites
                                                                    .into_iter()
                                                                    .map(|entry| {
                                                                        let id = entry.invite.id;
                                                                        let label = entry.invite.label.clone();
                                                                        let token = entry.invite.token.clone();
                                                                        let names = entry
                                                                            .guests
                                                                            .iter()
                                                                            .map(|g| g.name.clone())
                                                                            .collect::<Vec<_>>()
                                                                            .join(", ");
                                                                        let answered = if entry.has_rsvp { "Yes" } else { "No" };
                                                                        let row = entry.clone();
                                                                        let share = entry.clone();
                                                                        view! {
                                                                            <tr>
                                                                                <td>{entry.invite.label.clone()}</td>
                                                                                <td>
                                                                                    <code>{entry.invite.token.clone()}</code>
                                                                                </td>
                                                                                <td>{names}</td>
                                                                                <td>{entry.invite.max_guests}</td>
                                                                                <td>{answered}</td>
                                                                                <td>
                                                                                    <button
                                                                                        class="btn-secondary"
                                                                                        on:click=move |_| copy_link(token.clone())
                                                                                    >
                                                                                        "Copy link"
                                                                                    </button>
                                                                                    <a
                                                                                        class="btn-secondary"
                                                                                        href=move || whatsapp_link(&share)
                                                                                        target="_blank"
                                                                                        rel="noopener"
                                                                                    >
                                                                                        "WhatsApp"
                                                                                    </a>
                                                                                    <button
                                                                                        class="btn-secondary"
                                                                                        on:click=move |_| edit_invite(row.clone())
                                                                                    >
                                                                                        "Edit"
                                                                                    </button>
                                                                                    <button
                                                                                        class="btn-danger"
                                                                                        on:click=move |_| remove_invite(id, label.clone())
                                                                                    >
                                                                                        "Delete"
                                                                                    </button>
                                                                                </td>
                                                                            </tr>
                                                                        }
                                                                    })
                                                                    .collect_view()
                                                                    .into_any()
                                                            }
                                                            Err(e) => {
                                                                view! {
                                                                    <tr>
                                                                        <td colspan="6">{error_message(&e)}</td>
                                                                    </tr>
                                                                }
                                                                    .into_any()
                                                            }
                                                        })
                                                }}
                                            </Suspense>
                                        </tbody>
                                    </table>
                                </div>
                            </section>

                            <section class="admin-section">
                                <h2>"Find a Guest"</h2>
                                <input
                                    class="form-input"
                                    type="search"
                                    placeholder="Type at least 3 letters"
                                    prop:value=move || search_term.get()
                                    on:input=move |ev| search_term.set(event_target_value(&ev))
                                />
                                <Suspense>
                                    {move || {
                                        search_results
                                            .get()
                                            .map(|result| match result {
                                                Ok(found) => {
                                                    view! {
                                                        <ul class="search-results">
                                                            {found
                                                                .into_iter()
                                                                .map(|guest| {
                                                                    view! {
                                                                        <li>
                                                                            <strong>{guest.name}</strong>
                                                                            " · "
                                                                            {guest.group}
                                                                            {format!(" (up to {})", guest.max_guests)}
                                                                        </li>
                                                                    }
                                                                })
                                                                .collect_view()}
                                                        </ul>
                                                    }
                                                        .into_any()
                                                }
                                                Err(e) => {
                                                    view! { <p class="error">{error_message(&e)}</p> }.into_any()
                                                }
                                            })
                                    }}
                                </Suspense>
                            </section>

                            <section class="admin-section">
                                <h2>"RSVPs"</h2>
                                <div class="table-responsive">
                                    <table class="admin-table">
                                        <tbody>
                                            <tr>
                                                <th>"Guest"</th>
                                                <th>"Invite"</th>
                                                <th>"Attending"</th>
                                                <th>"Guests"</th>
                                                <th>"Phone"</th>
                                                <th>"Message"</th>
                                                <th>"Table"</th>
                                            </tr>
                                            <Suspense fallback=|| {
                                                view! {
                                                    <tr>
                                                        <td colspan="7">"Loading..."</td>
                                                    </tr>
                                                }
                                            }>
                                                {move || {
                                                    rsvps_fetcher
                                                        .get()
                                                        .map(|result| match result {
                                                            Ok(rsvps) if rsvps.is_empty() => {
                                                                view! {
                                                                    <tr>
                                                                        <td colspan="7">"No answers yet"</td>
                                                                    </tr>
                                                                }
                                                                    .into_any()
                                                            }
                                                            Ok(rsvps) => {
                                                                rsvps
                                                                    .into_iter()
                                                                    .map(|rsvp| {
                                                                        view! {
                                                                            <tr class:declined=!rsvp.attending>
                                                                                <td>{rsvp.guest_name.clone()}</td>
                                                                                <td>{rsvp.invite_label.clone()}</td>
                                                                                <td>{if rsvp.attending { "Yes" } else { "No" }}</td>
                                                                                <td>{rsvp.guests_count}</td>
                                                                                <td>{rsvp.phone.clone().unwrap_or_default()}</td>
                                                                                <td>{rsvp.message.clone().unwrap_or_default()}</td>
                                                                                <td>
                                                                                    {rsvp
                                                                                        .attending
                                                                                        .then(|| short_table_name(rsvp.table_assignment.as_deref()))}
                                                                                </td>
                                                                            </tr>
                                                                        }
                                                                    })
                                                                    .collect_view()
                                                                    .into_any()
                                                            }
                                                            Err(e) => {
                                                                view! {
                                                                    <tr>
                                                                        <td colspan="7">{error_message(&e)}</td>
                                                                    </tr>
                                                                }
                                                                    .into_any()
                                                            }
                                                        })
                                                }}
                                            </Suspense>
                                        </tbody>
                                    </table>
                                </div>
                            </section>

                            <section class="admin-section">
                                <h2>"Tables"</h2>
                                <form class="admin-form inline" on:submit=table_submit>
                                    <input
                                        class="form-input"
                                        type="text"
                                        placeholder="Garden - Table 1"
                                        prop:value=move || table_name.get()
                                        on:input=move |ev| table_name.set(event_target_value(&ev))
                                    />
                                    <input
                                        class="form-input"
                                        type="number"
                                        min="1"
                                        placeholder="Seats"
                                        prop:value=move || table_capacity.get()
                                        on:input=move |ev| table_capacity.set(event_target_value(&ev))
                                    />
                                    <button type="submit" class="btn-primary">
                                        "Add Table"
                                    </button>
                                </form>
                                <Suspense>
                                    {move || {
                                        tables_fetcher
                                            .get()
                                            .map(|result| match result {
                                                Ok(tables) => {
                                                    view! {
                                                        <ul class="table-list">
                                                            {tables
                                                                .into_iter()
                                                                .map(|table| {
                                                                    let id = table.id;
                                                                    view! {
                                                                        <li>
                                                                            <span>{table.name.clone()}</span>
                                                                            <input
                                                                                class="form-input capacity"
                                                                                type="number"
                                                                                min="1"
                                                                                prop:value=table.capacity.to_string()
                                                                                on:change=move |ev| {
                                                                                    if let Ok(value) = event_target_value(&ev).parse::<i32>() {
                                                                                        set_capacity(id, value);
                                                                                    }
                                                                                }
                                                                            />
                                                                            <button class="btn-danger" on:click=move |_| remove_table(id)>
                                                                                "Delete"
                                                                            </button>
                                                                        </li>
                                                                    }
                                                                })
                                                                .collect_view()}
                                                        </ul>
                                                    }
                                                        .into_any()
                                                }
                                                Err(e) => {
                                                    view! { <p class="error">{error_message(&e)}</p> }.into_any()
                                                }
                                            })
                                    }}
                                </Suspense>
                            </section>

                            <section class="admin-section">
                                <h2>"Seating Plan"</h2>
                                <Suspense fallback=|| view! { <p>"Loading..."</p> }>
                                    {move || {
                                        seating()
                                            .map(|(chart, unseated)| {
                                                view! {
                                                    <div class="seating">
                                                        <div class="unseated">
                                                            <h3>"Waiting for a table"</h3>
                                                            <ul>
                                                                {unseated
                                                                    .into_iter()
                                                                    .map(|rsvp| {
                                                                        let id = rsvp.id;
                                                                        view! {
                                                                            <li
                                                                                class:selected=move || selected_rsvp.get() == Some(id)
                                                                                on:click=move |_| selected_rsvp.set(Some(id))
                                                                            >
                                                                                {format!("{} ({})", rsvp.guest_name, rsvp.guests_count)}
                                                                            </li>
                                                                        }
                                                                    })
                                                                    .collect_view()}
                                                            </ul>
                                                        </div>
                                                        <div class="tables-grid">
                                                            {chart
                                                                .into_iter()
                                                                .map(|occupancy| view! { <SeatingTable occupancy selected_rsvp seat unseat /> })
                                                                .collect_view()}
                                                        </div>
                                                    </div>
                                                }
                                            })
                                    }}
                                </Suspense>
                            </section>
                        </div>
                    }
                        .into_any()
                } else {
                    view! { <p>"Checking access..."</p> }.into_any()
                }
            }}
        </Suspense>
    }
}

#[component]
fn SeatingTable<S, U>(
    occupancy: TableOccupancy,
    selected_rsvp: RwSignal<Option<i32>>,
    seat: S,
    unseat: U,
) -> impl IntoView
where
    S: Fn(i32, String) + Copy + Send + Sync + 'static,
    U: Fn(i32) + Copy + Send + Sync + 'static,
{
    let name = StoredValue::new(occupancy.table.name.clone());
    let place_selected = move |_| {
        if let Some(rsvp_id) = selected_rsvp.get() {
            seat(rsvp_id, name.get_value());
        }
    };

    view! {
        <div class=format!("seating-table {}", occupancy.status.css_class()) on:click=place_selected>
            <h4>{occupancy.table.name.clone()}</h4>
            <p class="fill">
                {format!("{}/{} seats", occupancy.occupied, occupancy.table.capacity)}
                <span class="bar" style=format!("width: {}%", occupancy.fill_percent)></span>
            </p>
            <ol class="seats">
                {occupancy
                    .seats
                    .into_iter()
                    .map(|label| match label {
                        Some(label) => view! { <li>{label}</li> }.into_any(),
                        None => view! { <li class="free">"free"</li> }.into_any(),
                    })
                    .collect_view()}
            </ol>
            <ul class="parties">
                {occupancy
                    .guests
                    .into_iter()
                    .map(|rsvp| {
                        let id = rsvp.id;
                        view! {
                            <li>
                                {rsvp.guest_name}
                                <button
                                    class="btn-link"
                                    on:click=move |ev| {
                                        ev.stop_propagation();
                                        unseat(id);
                                    }
                                >
                                    "remove"
                                </button>
                            </li>
                        }
                    })
                    .collect_view()}
            </ul>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_guest_lines() {
        let guests = parse_guest_lines("Ana Silva\n\n  +Rui Silva \n+\nBeatriz +1\n");
        assert_eq!(
            guests,
            vec![
                GuestForm {
                    name: "Ana Silva".to_string(),
                    kind: GuestKind::Principal,
                },
                GuestForm {
                    name: "Rui Silva".to_string(),
                    kind: GuestKind::Companion,
                },
                GuestForm {
                    name: "Beatriz +1".to_string(),
                    kind: GuestKind::Principal,
                },
            ]
        );
        assert!(parse_guest_lines("   \n").is_empty());
    }

    #[test]
    fn test_error_message_strips_prefix() {
        let err: ServerFnError<NoCustomError> =
            ServerFnError::ServerError("Invite not found.".to_string());
        assert_eq!(error_message(&err), "Invite not found.");
    }

    #[cfg(feature = "ssr")]
    #[test]
    fn test_cookie_value() {
        use axum::http::{header::COOKIE, HeaderMap, HeaderValue};

        let mut headers = HeaderMap::new();
        assert_eq!(cookie_value(&headers, ADMIN_COOKIE), None);

        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; admin_token_old=x; admin_token=abc-123"),
        );
        assert_eq!(
            cookie_value(&headers, ADMIN_COOKIE),
            Some("abc-123".to_string())
        );
    }
}
