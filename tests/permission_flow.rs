mod helpers;

use std::sync::Arc;

use helpers::{BlockingAuthenticator, StaticAuthenticator};
use tillgate::ability::types::{Action, Subject};
use tillgate::gate::{Gate, GateOutcome, GuardDecision, RouteGuard};
use tillgate::session::store::MemorySessionStore;
use tillgate::session::{AuthPhase, Session};

#[tokio::test]
async fn manager_login_gates_and_logout() {
    helpers::init_tracing();

    let session = Session::new(Box::new(MemorySessionStore::new()));
    let authenticator = StaticAuthenticator::with_role("amira", "manager");

    session
        .login(&authenticator, "amira", "secret")
        .await
        .unwrap();

    let snap = session.snapshot();
    assert_eq!(snap.phase, AuthPhase::Authenticated);
    assert_eq!(snap.identity.as_ref().unwrap().username, "amira");

    // Screen sections a manager sees
    let products = Gate::new(Action::Update, Subject::Product);
    let reports = Gate::new(Action::Read, Subject::Reports);
    let user_admin = Gate::new(Action::Delete, Subject::User);
    assert_eq!(products.outcome(&snap.ability), GateOutcome::Show);
    assert_eq!(reports.outcome(&snap.ability), GateOutcome::Show);
    assert_eq!(user_admin.outcome(&snap.ability), GateOutcome::Fallback);

    // Route guards
    let reports_route = RouteGuard::requiring(Gate::new(Action::Read, Subject::Reports));
    assert_eq!(reports_route.decide(&snap), GuardDecision::Allow);

    // Logout resets everything
    session.logout().unwrap();
    assert!(!session.can(Action::Read, Subject::Dashboard));
    let snap = session.snapshot();
    assert_eq!(snap.phase, AuthPhase::Anonymous);
    assert_eq!(reports_route.decide(&snap), GuardDecision::RedirectToLogin);
}

#[tokio::test]
async fn admin_passes_every_gate() {
    let session = Session::new(Box::new(MemorySessionStore::new()));
    let authenticator = StaticAuthenticator::with_role("root", "admin");
    session.login(&authenticator, "root", "secret").await.unwrap();

    let snap = session.snapshot();
    for action in Action::ALL {
        for subject in Subject::VARIANTS {
            assert_eq!(
                Gate::new(action, subject).outcome(&snap.ability),
                GateOutcome::Show
            );
        }
    }
}

#[tokio::test]
async fn grant_strings_drive_gates() {
    let session = Session::new(Box::new(MemorySessionStore::new()));
    let authenticator = StaticAuthenticator::with_grants(
        "jonas",
        &["read-Dashboard", "read-SalesInvoice", "broken-entry"],
    );
    session
        .login(&authenticator, "jonas", "secret")
        .await
        .unwrap();

    assert!(session.can(Action::Read, Subject::Dashboard));
    assert!(session.can(Action::Read, Subject::SalesInvoice));
    assert!(!session.can(Action::Create, Subject::SalesInvoice));
}

#[tokio::test]
async fn logout_during_inflight_fetch_discards_result() {
    helpers::init_tracing();

    let session = Arc::new(Session::new(Box::new(MemorySessionStore::new())));
    let authenticator = Arc::new(BlockingAuthenticator::with_role("amira", "manager"));

    let login_session = session.clone();
    let login_auth = authenticator.clone();
    let login = tokio::spawn(async move {
        login_session
            .login(login_auth.as_ref(), "amira", "secret")
            .await
    });

    // Wait until the login attempt has published its resolving snapshot
    while session.snapshot().phase != AuthPhase::Resolving {
        tokio::task::yield_now().await;
    }

    // Log out while the fetch is still in flight, then let it resolve
    session.logout().unwrap();
    authenticator.release.notify_one();
    login.await.unwrap().unwrap();

    // The stale result must have been discarded
    let snap = session.snapshot();
    assert_eq!(snap.phase, AuthPhase::Anonymous);
    assert!(snap.ability.is_empty());
    assert!(!session.can(Action::Read, Subject::Dashboard));
}

#[tokio::test]
async fn route_guard_reports_loading_while_resolving() {
    let session = Arc::new(Session::new(Box::new(MemorySessionStore::new())));
    let authenticator = Arc::new(BlockingAuthenticator::with_role("amira", "user"));
    let guard = RouteGuard::requiring(Gate::new(Action::Read, Subject::Dashboard));

    let login_session = session.clone();
    let login_auth = authenticator.clone();
    let login = tokio::spawn(async move {
        login_session
            .login(login_auth.as_ref(), "amira", "secret")
            .await
    });

    while session.snapshot().phase != AuthPhase::Resolving {
        tokio::task::yield_now().await;
    }
    assert_eq!(guard.decide(&session.snapshot()), GuardDecision::Loading);

    authenticator.release.notify_one();
    login.await.unwrap().unwrap();
    assert_eq!(guard.decide(&session.snapshot()), GuardDecision::Allow);
}

#[tokio::test]
async fn subscribers_reevaluate_on_swap() {
    let session = Session::new(Box::new(MemorySessionStore::new()));
    let mut rx = session.subscribe();
    let gate = Gate::new(Action::Create, Subject::SalesInvoice);

    assert_eq!(
        gate.select(&rx.borrow().ability, "new invoice button", ""),
        ""
    );

    let authenticator = StaticAuthenticator::with_role("jonas", "user");
    session
        .login(&authenticator, "jonas", "secret")
        .await
        .unwrap();

    rx.changed().await.unwrap();
    let snap = rx.borrow_and_update().clone();
    assert_eq!(
        gate.select(&snap.ability, "new invoice button", ""),
        "new invoice button"
    );

    session.logout().unwrap();
    rx.changed().await.unwrap();
    assert_eq!(
        gate.select(&rx.borrow().ability, "new invoice button", ""),
        ""
    );
}
