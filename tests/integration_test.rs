// Integration tests for org-divisions

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use org_divisions::api::{ApiError, ApiResult, DivisionsApi};
use org_divisions::app::update::{handle_key, reload};
use org_divisions::app::{AppState, InputMode, ModalState};
use org_divisions::model::{Division, DivisionId, DivisionPayload};
use reqwest::{Method, StatusCode};

fn mk_div(id: u64, name: &str, parent: Option<u64>, level: u32, collaborators: u64) -> Division {
    Division {
        id,
        name: name.to_string(),
        parent_id: parent,
        ambassador_full_name: (id % 2 == 0).then(|| format!("Ambassador {id}")),
        level,
        collaborators_count: collaborators,
        created_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
        updated_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
    }
}

fn seed() -> Vec<Division> {
    vec![
        mk_div(1, "Corporativo", None, 1, 4),
        mk_div(2, "Comercial", Some(1), 2, 22),
        mk_div(3, "Operaciones", Some(1), 2, 35),
        mk_div(4, "Ventas Norte", Some(2), 3, 11),
        mk_div(5, "Ventas Sur", Some(2), 3, 9),
        mk_div(6, "Almacén", Some(3), 3, 14),
    ]
}

#[derive(Default)]
struct FakeState {
    divisions: Vec<Division>,
    fail_list: bool,
    deleted: Vec<DivisionId>,
    created: Vec<DivisionPayload>,
    updated: Vec<(DivisionId, DivisionPayload)>,
    subdivision_calls: Vec<DivisionId>,
}

/// In-memory divisions service sharing its state with the test.
#[derive(Clone, Default)]
struct FakeApi(Rc<RefCell<FakeState>>);

impl FakeApi {
    fn with(divisions: Vec<Division>) -> Self {
        let api = Self::default();
        api.0.borrow_mut().divisions = divisions;
        api
    }

    fn not_found(method: Method, id: DivisionId) -> ApiError {
        ApiError::Status {
            method,
            url: format!("http://fake/divisions/{id}"),
            status: StatusCode::NOT_FOUND,
        }
    }
}

impl DivisionsApi for FakeApi {
    fn list_all(&self) -> ApiResult<Vec<Division>> {
        let s = self.0.borrow();
        if s.fail_list {
            return Err(ApiError::Status {
                method: Method::GET,
                url: "http://fake/divisions".into(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            });
        }
        Ok(s.divisions.clone())
    }

    fn list_subdivisions(&self, id: DivisionId) -> ApiResult<Vec<Division>> {
        let mut s = self.0.borrow_mut();
        s.subdivision_calls.push(id);
        Ok(s.divisions.iter().filter(|d| d.parent_id == Some(id)).cloned().collect())
    }

    fn create(&self, payload: &DivisionPayload) -> ApiResult<Division> {
        let mut s = self.0.borrow_mut();
        s.created.push(payload.clone());
        let id = s.divisions.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let d = mk_div(
            id,
            payload.name.as_deref().unwrap_or(""),
            payload.parent_id.flatten(),
            payload.level.unwrap_or(1),
            0,
        );
        s.divisions.push(d.clone());
        Ok(d)
    }

    fn update(&self, id: DivisionId, payload: &DivisionPayload) -> ApiResult<Division> {
        let mut s = self.0.borrow_mut();
        s.updated.push((id, payload.clone()));
        let d = s
            .divisions
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| Self::not_found(Method::PATCH, id))?;
        if let Some(name) = &payload.name {
            d.name = name.clone();
        }
        Ok(d.clone())
    }

    fn delete(&self, id: DivisionId) -> ApiResult<()> {
        let mut s = self.0.borrow_mut();
        let before = s.divisions.len();
        s.divisions.retain(|d| d.id != id);
        if s.divisions.len() == before {
            return Err(Self::not_found(Method::DELETE, id));
        }
        s.deleted.push(id);
        Ok(())
    }
}

fn loaded_app() -> (AppState, FakeApi) {
    let api = FakeApi::with(seed());
    let mut app = AppState::new(Box::new(api.clone()));
    reload(&mut app);
    (app, api)
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn type_text(app: &mut AppState, text: &str) {
    for c in text.chars() {
        handle_key(app, key(KeyCode::Char(c)));
    }
}

fn visible_names(app: &AppState) -> Vec<String> {
    app.rows.iter().map(|r| r.name().to_string()).collect()
}

// 1) Loading derives rows, filter options and totals
#[test]
fn reload_populates_rows_and_filter_options() {
    let (app, _api) = loaded_app();
    assert!(!app.loading);
    assert!(!app.reload_requested);
    assert_eq!(app.rows.len(), 6);
    assert_eq!(app.total_collaborators(), 95);
    assert_eq!(app.rows_all[1].subdivision_count, 2);
    assert_eq!(app.filter_options.names.len(), 6);
    let parents: Vec<&str> = app.filter_options.parent_names.iter().map(|o| o.text.as_str()).collect();
    assert_eq!(parents, vec!["Corporativo", "Comercial", "Operaciones"]);
    let levels: Vec<&str> = app.filter_options.levels.iter().map(|o| o.text.as_str()).collect();
    assert_eq!(levels, vec!["Level 1", "Level 2", "Level 3"]);
}

// 2) A failed fetch shows an error and keeps what was loaded
#[test]
fn reload_failure_shows_error_and_keeps_rows() {
    let (mut app, api) = loaded_app();
    api.0.borrow_mut().fail_list = true;
    reload(&mut app);
    assert!(!app.loading);
    assert_eq!(app.input_mode, InputMode::Modal);
    match &app.modal {
        Some(ModalState::Info { message }) => assert!(message.starts_with("Could not load divisions")),
        other => panic!("unexpected modal: {other:?}"),
    }
    assert_eq!(app.rows.len(), 6);

    handle_key(&mut app, key(KeyCode::Esc));
    assert!(app.modal.is_none());
    assert_eq!(app.input_mode, InputMode::Normal);
}

// 3) Search applies on every keystroke; Esc clears it
#[test]
fn search_updates_live_and_esc_clears() {
    let (mut app, _api) = loaded_app();
    handle_key(&mut app, key(KeyCode::Char('/')));
    assert_eq!(app.input_mode, InputMode::Search);
    type_text(&mut app, "VENTAS");
    assert_eq!(visible_names(&app), vec!["Ventas Norte", "Ventas Sur"]);
    assert_eq!(app.search.term(), "VENTAS");

    handle_key(&mut app, key(KeyCode::Backspace));
    assert_eq!(app.search.term(), "VENTA");

    handle_key(&mut app, key(KeyCode::Enter));
    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(app.rows.len(), 2);

    handle_key(&mut app, key(KeyCode::Char('/')));
    handle_key(&mut app, key(KeyCode::Esc));
    assert_eq!(app.search.term(), "");
    assert_eq!(app.rows.len(), 6);
}

// 4) Column filters from the menu combine with the search and only narrow
#[test]
fn filter_menu_combines_with_search() {
    let (mut app, _api) = loaded_app();
    handle_key(&mut app, key(KeyCode::Char('f')));
    // Name -> Parent division -> Level
    handle_key(&mut app, key(KeyCode::Tab));
    handle_key(&mut app, key(KeyCode::Tab));
    // Level 3
    handle_key(&mut app, key(KeyCode::Down));
    handle_key(&mut app, key(KeyCode::Down));
    handle_key(&mut app, key(KeyCode::Char(' ')));
    handle_key(&mut app, key(KeyCode::Esc));
    assert_eq!(visible_names(&app), vec!["Ventas Norte", "Ventas Sur", "Almacén"]);

    app.search.update_search_term("comercial");
    org_divisions::search::apply_filters_and_search(&mut app);
    assert_eq!(visible_names(&app), vec!["Ventas Norte", "Ventas Sur"]);

    handle_key(&mut app, key(KeyCode::Char('F')));
    assert_eq!(visible_names(&app), vec!["Comercial", "Ventas Norte", "Ventas Sur"]);
}

// 5) Sort keys cycle ascending, descending, off
#[test]
fn sort_keys_cycle_order() {
    let (mut app, _api) = loaded_app();
    handle_key(&mut app, key(KeyCode::Char('4')));
    assert_eq!(app.rows.first().map(|r| r.name()), Some("Corporativo"));
    handle_key(&mut app, key(KeyCode::Char('4')));
    assert_eq!(app.rows.first().map(|r| r.name()), Some("Operaciones"));
    handle_key(&mut app, key(KeyCode::Char('4')));
    assert!(app.sort.is_none());
    assert_eq!(app.rows.first().map(|r| r.name()), Some("Corporativo"));
    assert_eq!(app.rows.last().map(|r| r.name()), Some("Almacén"));
}

// 6) Cursor follows the focused division across re-sorts
#[test]
fn cursor_tracks_focused_row_when_resorting() {
    let (mut app, _api) = loaded_app();
    handle_key(&mut app, key(KeyCode::Down));
    handle_key(&mut app, key(KeyCode::Down));
    assert_eq!(app.selected_row().map(|r| r.name()), Some("Operaciones"));
    handle_key(&mut app, key(KeyCode::Char('1')));
    assert_eq!(app.selected_row().map(|r| r.name()), Some("Operaciones"));
}

// 7) Checkbox selection and the header state
#[test]
fn checking_rows_updates_check_state() {
    use org_divisions::app::selection::CheckState;
    let (mut app, _api) = loaded_app();
    handle_key(&mut app, key(KeyCode::Char(' ')));
    assert_eq!(app.selection.check_state(&app.rows_all), CheckState::Partial);
    handle_key(&mut app, key(KeyCode::Char('a')));
    assert_eq!(app.selection.check_state(&app.rows_all), CheckState::All);
    handle_key(&mut app, key(KeyCode::Char('a')));
    assert_eq!(app.selection.check_state(&app.rows_all), CheckState::None);
}

// 8) Deleting checked rows goes through the API and reloads
#[test]
fn delete_checked_rows_after_confirmation() {
    let (mut app, api) = loaded_app();
    app.selection.set_checked(4, true);
    app.selection.set_checked(5, true);
    handle_key(&mut app, key(KeyCode::Char('d')));
    assert!(matches!(app.modal, Some(ModalState::DeleteConfirm { selected: 1, .. })));

    // Cancel is the default
    handle_key(&mut app, key(KeyCode::Enter));
    assert!(api.0.borrow().deleted.is_empty());

    handle_key(&mut app, key(KeyCode::Char('d')));
    handle_key(&mut app, key(KeyCode::Left));
    handle_key(&mut app, key(KeyCode::Enter));
    assert_eq!(api.0.borrow().deleted, vec![4, 5]);
    assert_eq!(app.rows_all.len(), 4);
    assert!(app.selection.is_empty());
    let comercial = app.rows_all.iter().find(|r| r.id() == 2).unwrap();
    assert_eq!(comercial.subdivision_count, 0);
}

// 9) Rename and create send the expected payloads
#[test]
fn rename_and_create_send_payloads() {
    let (mut app, api) = loaded_app();
    handle_key(&mut app, key(KeyCode::Down));
    handle_key(&mut app, key(KeyCode::Char('e')));
    for _ in 0.."Comercial".len() {
        handle_key(&mut app, key(KeyCode::Backspace));
    }
    type_text(&mut app, "Ventas");
    handle_key(&mut app, key(KeyCode::Enter));
    assert_eq!(api.0.borrow().updated, vec![(2, DivisionPayload::rename("Ventas"))]);
    assert!(app.rows_all.iter().any(|r| r.name() == "Ventas"));

    // new subdivision under the focused row (still "Ventas", id 2)
    handle_key(&mut app, key(KeyCode::Char('n')));
    type_text(&mut app, "  Ventas Centro ");
    handle_key(&mut app, key(KeyCode::Enter));
    let created = api.0.borrow().created.clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name.as_deref(), Some("Ventas Centro"));
    assert_eq!(created[0].parent_id, Some(Some(2)));
    assert_eq!(created[0].level, Some(3));
    assert_eq!(app.rows_all.len(), 7);
    let ventas = app.rows_all.iter().find(|r| r.id() == 2).unwrap();
    assert_eq!(ventas.subdivision_count, 3);
}

// 10) Enter loads subdivisions of the focused row
#[test]
fn enter_loads_subdivisions() {
    let (mut app, api) = loaded_app();
    handle_key(&mut app, key(KeyCode::Enter));
    assert_eq!(api.0.borrow().subdivision_calls, vec![1]);
    let subs = app.subdivisions.as_ref().unwrap();
    assert_eq!(subs.parent_id, 1);
    assert_eq!(subs.items.len(), 2);
}

// 11) Paging moves by rows_per_page and quitting stops the loop
#[test]
fn paging_and_quit() {
    let api = FakeApi::with((1..=25).map(|i| mk_div(i, &format!("D{i:02}"), None, 1, i)).collect());
    let mut app = AppState::new(Box::new(api)).with_page_size(10);
    reload(&mut app);
    handle_key(&mut app, key(KeyCode::Right));
    assert_eq!(app.selected_index, 10);
    assert_eq!(app.page(), (1, 3));
    handle_key(&mut app, key(KeyCode::PageDown));
    handle_key(&mut app, key(KeyCode::PageDown));
    assert_eq!(app.selected_index, 24);
    handle_key(&mut app, key(KeyCode::Left));
    assert_eq!(app.selected_index, 14);
    assert!(!handle_key(&mut app, key(KeyCode::Char('q'))));
}

// 12) The screen renders headers, totals and rows
#[test]
fn render_draws_table_and_totals() {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    let (mut app, _api) = loaded_app();
    let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
    terminal
        .draw(|f| org_divisions::ui::render(f, &mut app))
        .unwrap();
    let text: String = terminal
        .backend()
        .buffer()
        .content()
        .iter()
        .map(|c| c.symbol())
        .collect();
    assert!(text.contains("Total collaborators: 95"));
    assert!(text.contains("DIVISION"));
    assert!(text.contains("Operaciones"));
    assert!(text.contains("page 1/1"));
}

// 13) `list` prints the filtered and sorted view
#[test]
fn run_list_prints_json_and_table() {
    use org_divisions::cli::{ListArgs, run_list};

    let api = FakeApi::with(seed());
    let args = ListArgs {
        search: Some("ventas".into()),
        sort: Some("collaborators:desc".parse().unwrap()),
        json: true,
        ..ListArgs::default()
    };
    let mut out = Vec::new();
    run_list(&api, &args, &mut out).unwrap();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let names: Vec<&str> = v.as_array().unwrap().iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Ventas Norte", "Ventas Sur"]);
    assert_eq!(v[0]["parentName"], "Comercial");

    let args = ListArgs {
        levels: vec![2],
        ..ListArgs::default()
    };
    let mut out = Vec::new();
    run_list(&api, &args, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("DIVISION"));
    assert!(text.contains("Comercial"));
    assert!(!text.contains("Almacén"));
    assert!(text.trim_end().ends_with("2 of 6 divisions, 95 collaborators in total"));
}

// 13b) A failed fetch makes `list` fail without printing anything
#[test]
fn run_list_reports_fetch_failure() {
    use org_divisions::cli::{ListArgs, run_list};

    let api = FakeApi::with(seed());
    api.0.borrow_mut().fail_list = true;
    let mut out = Vec::new();
    let err = run_list(&api, &ListArgs::default(), &mut out).unwrap_err();
    assert!(err.to_string().contains("could not load divisions"));
    assert!(err.to_string().contains("500"));
    assert!(out.is_empty());
}

// 8b) Delete failures and a failed reload are reported together
#[test]
fn delete_failure_keeps_reload_error_visible() {
    let (mut app, api) = loaded_app();
    app.selection.set_checked(4, true);
    app.selection.set_checked(99, true);
    api.0.borrow_mut().fail_list = true;
    handle_key(&mut app, key(KeyCode::Char('d')));
    handle_key(&mut app, key(KeyCode::Left));
    handle_key(&mut app, key(KeyCode::Enter));
    assert_eq!(api.0.borrow().deleted, vec![4]);
    match &app.modal {
        Some(ModalState::Info { message }) => {
            assert!(message.starts_with("Could not load divisions"));
            assert!(message.contains("Could not delete:\n#99"));
        }
        other => panic!("unexpected modal: {other:?}"),
    }
}

// 14) Theme config roundtrip and init
#[test]
fn theme_roundtrip_and_init() {
    use org_divisions::app::Theme;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("theme.conf").to_string_lossy().to_string();
    let t = Theme::mocha();
    t.write_file(&path).expect("write theme");
    let t2 = Theme::from_file(&path).expect("read theme");
    assert_eq!(t.text, t2.text);
    assert_eq!(t.title, t2.title);
    assert_eq!(t.checked_fg, t2.checked_fg);

    let fresh = dir.path().join("fresh_theme.conf");
    let _ = Theme::load_or_init(&fresh.to_string_lossy());
    assert!(fresh.exists());
}

mod http {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;
    use std::time::Duration;

    use org_divisions::api::{ApiError, DivisionsApi, HttpDivisionsApi};
    use org_divisions::model::DivisionPayload;

    /// Serve `responses` in order, one connection each, and return the
    /// request lines and bodies that were received.
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<(String, String)>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/api/", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().unwrap();
                stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
                let mut reader = BufReader::new(stream);
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap();
                        }
                    }
                }
                let mut req_body = vec![0u8; content_length];
                reader.read_exact(&mut req_body).unwrap();
                seen.push((
                    request_line.trim_end().to_string(),
                    String::from_utf8(req_body).unwrap(),
                ));

                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let mut stream = reader.into_inner();
                stream.write_all(response.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
            seen
        });
        (base, handle)
    }

    fn client(base: &str) -> HttpDivisionsApi {
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        HttpDivisionsApi::with_client(base, client)
    }

    const LIST: &str = r#"[
        {"id":1,"name":"Corporativo","parentId":null,"ambassadorFullName":null,"level":1,"collaboratorsCount":4,"createdAt":"2024-01-01T00:00:00.000Z","updatedAt":"2024-01-01T00:00:00.000Z"},
        {"id":2,"name":"Comercial","parentId":1,"ambassadorFullName":"Ana","level":2,"collaboratorsCount":22,"createdAt":"2024-01-01T00:00:00","updatedAt":"2024-01-02T00:00:00"}
    ]"#;

    #[test]
    fn list_all_enriched_over_http() {
        let (base, handle) = serve(vec![(200, LIST)]);
        let api = client(&base);
        assert!(!api.base_url().ends_with('/'));
        let rows = api.list_all_enriched().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].subdivision_count, 1);
        assert_eq!(rows[1].parent_name.as_deref(), Some("Corporativo"));
        let seen = handle.join().unwrap();
        assert_eq!(seen[0].0, "GET /api/divisions HTTP/1.1");
    }

    #[test]
    fn mutations_use_expected_methods_and_paths() {
        let created = r#"{"id":9,"name":"Legal","parentId":1,"level":2,"collaboratorsCount":0,"createdAt":"2024-03-01T00:00:00Z","updatedAt":"2024-03-01T00:00:00Z"}"#;
        let (base, handle) = serve(vec![(200, "[]"), (200, created), (200, created), (200, "")]);
        let api = client(&base);

        assert!(api.list_subdivisions(1).unwrap().is_empty());
        let payload = DivisionPayload::rename("Legal");
        let d = api.create(&payload).unwrap();
        assert_eq!(d.id, 9);
        assert_eq!(d.ambassador_full_name, None);
        api.update(9, &payload).unwrap();
        api.delete(9).unwrap();

        let seen = handle.join().unwrap();
        let lines: Vec<&str> = seen.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            lines,
            vec![
                "GET /api/divisions/1/subdivisions HTTP/1.1",
                "POST /api/divisions HTTP/1.1",
                "PATCH /api/divisions/9 HTTP/1.1",
                "DELETE /api/divisions/9 HTTP/1.1",
            ]
        );
        assert_eq!(seen[1].1, r#"{"name":"Legal"}"#);
    }

    #[test]
    fn error_status_and_bad_body_are_reported() {
        let (base, handle) = serve(vec![(404, "{}"), (200, "not json")]);
        let api = client(&base);

        match api.delete(42) {
            Err(ApiError::Status { status, url, .. }) => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert!(url.ends_with("/api/divisions/42"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(matches!(api.list_all(), Err(ApiError::Decode { .. })));
        handle.join().unwrap();
    }
}
