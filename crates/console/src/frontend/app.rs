//! Leptos application: one catch-all route guarded by the console shell.

use std::sync::Arc;

use leptos::*;
use leptos_router::*;

use hrms_auth::{PermissionStore, SessionProvider};
use hrms_navigation::VisibleMenuItem;

use crate::frontend::storage;
use crate::{ConsoleShell, NavigationOutcome, PersistedSession};

#[derive(Clone, Copy)]
struct ShellContext {
    shell: StoredValue<ConsoleShell>,
    outcome: RwSignal<Option<NavigationOutcome>>,
    /// Bumped when expansion state changes outside navigation.
    expansion: RwSignal<u64>,
}

/// Main application component.
#[component]
pub fn App() -> impl IntoView {
    let provider = Arc::new(SessionProvider::new(Arc::new(PermissionStore::new())));
    if let Some(saved) = storage::load() {
        if provider.restore(saved.session, saved.permissions).is_err() {
            storage::clear();
        }
    }

    provide_context(ShellContext {
        shell: store_value(ConsoleShell::hr_console(provider)),
        outcome: create_rw_signal(None),
        expansion: create_rw_signal(0),
    });

    view! {
        <Router>
            <div class="layout">
                <Sidebar/>
                <main>
                    <Routes>
                        <Route path="/*any" view=GuardedOutlet/>
                    </Routes>
                </main>
            </div>
        </Router>
    }
}

/// Runs the gate on every location change and renders the resulting screen.
#[component]
fn GuardedOutlet() -> impl IntoView {
    let ctx = expect_context::<ShellContext>();
    let location = use_location();
    let navigate = use_navigate();

    create_effect(move |_| {
        let requested = location.pathname.get();
        let Some(outcome) = ctx.shell.try_update_value(|shell| shell.navigate(&requested)) else {
            return;
        };
        if outcome.path != requested {
            navigate(
                &outcome.path,
                NavigateOptions {
                    replace: true,
                    ..Default::default()
                },
            );
        }
        ctx.outcome.set(Some(outcome));
    });

    view! {
        {move || ctx.outcome.get().map(|outcome| view! { <ScreenView outcome=outcome/> })}
    }
}

/// Placeholder host for the screen components.
#[component]
fn ScreenView(outcome: NavigationOutcome) -> impl IntoView {
    let params: Vec<String> = serde_json::to_value(&outcome.params)
        .ok()
        .and_then(|v| v.as_object().cloned())
        .map(|obj| obj.iter().map(|(k, v)| format!("{k}={v}")).collect())
        .unwrap_or_default();

    match outcome.screen.as_str() {
        "login" => view! {
            <section class="screen login">
                <h1>"Sign in"</h1>
                <p>"Use your HR account to continue."</p>
            </section>
        }
        .into_view(),
        "unauthorized" => view! {
            <section class="screen unauthorized">
                <h1>"Unauthorized"</h1>
                <p>"You do not have access to this page."</p>
                <A href="/home">"Back to dashboard"</A>
            </section>
        }
        .into_view(),
        screen => {
            let screen = screen.to_string();
            view! {
                <section class="screen" data-screen=screen.clone()>
                    <h1>{screen}</h1>
                    <p class="params">{params.join(", ")}</p>
                </section>
            }
            .into_view()
        }
    }
}

#[component]
fn Sidebar() -> impl IntoView {
    let ctx = expect_context::<ShellContext>();
    let navigate = use_navigate();

    let logout = move |_| {
        if let Some(outcome) = ctx.shell.try_update_value(|shell| shell.logout()) {
            storage::clear();
            navigate(&outcome.path, Default::default());
            ctx.outcome.set(Some(outcome));
        }
    };

    // Keep the saved session in step with what is rendered.
    create_effect(move |_| {
        if ctx.outcome.with(|o| o.is_some()) {
            ctx.shell.with_value(|shell| match PersistedSession::capture(shell.provider()) {
                Some(saved) => storage::save(&saved),
                None => storage::clear(),
            });
        }
    });

    view! {
        <nav class="sidebar">
            {move || {
                ctx.expansion.track();
                ctx.outcome
                    .get()
                    .map(|outcome| menu_items(ctx, outcome.menu.items))
            }}
            <button class="logout" on:click=logout>"Log out"</button>
        </nav>
    }
}

fn menu_items(ctx: ShellContext, items: Vec<VisibleMenuItem>) -> View {
    view! {
        <ul>
            {items
                .into_iter()
                .map(|item| {
                    let id = item.id.clone();
                    let expanded = ctx.shell.with_value(|shell| shell.is_expanded(&id));
                    let class = if item.active { "menu-item active" } else { "menu-item" };
                    let label = match item.path.clone() {
                        Some(path) => view! { <A href=path>{item.label.clone()}</A> }.into_view(),
                        None => view! { <span>{item.label.clone()}</span> }.into_view(),
                    };
                    let toggle = item.has_children().then(|| {
                        let id = id.clone();
                        view! {
                            <button
                                class="toggle"
                                on:click=move |_| {
                                    ctx.shell.update_value(|shell| {
                                        shell.toggle_menu(&id);
                                    });
                                    ctx.expansion.update(|n| *n += 1);
                                }
                            >
                                {if expanded { "▾" } else { "▸" }}
                            </button>
                        }
                    });
                    let children = (expanded && item.has_children())
                        .then(|| menu_items(ctx, item.children.clone()));
                    view! {
                        <li class=class>
                            {label}
                            {toggle}
                            {children}
                        </li>
                    }
                })
                .collect_view()}
        </ul>
    }
    .into_view()
}
