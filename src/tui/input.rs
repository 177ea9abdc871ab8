use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Mode};

pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // blocking sign-in screen: nothing works until a session exists
    if !app.authenticated() {
        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
            app.should_quit = true;
        }
        return;
    }

    match app.mode {
        Mode::Navigate => handle_navigate(app, key),
        Mode::Insert => handle_insert(app, key),
        Mode::Edit => handle_edit(app, key),
    }
}

fn handle_navigate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down => {
            if app.cursor + 1 < app.view.items.len() {
                app.cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Char('a') => app.mode = Mode::Insert,
        KeyCode::Char('e') => app.begin_edit(),
        KeyCode::Char(' ') | KeyCode::Char('x') | KeyCode::Enter => app.toggle_selected(),
        KeyCode::Char('d') => app.delete_selected(),
        KeyCode::Tab | KeyCode::Char('f') => {
            let next = app.view.filter.next();
            app.engine.set_filter(next);
            app.cursor = 0;
        }
        _ => {}
    }
}

fn handle_insert(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input.clear();
            app.add_in_flight = false;
            app.mode = Mode::Navigate;
        }
        // same guard as the form submit: whitespace never leaves the client
        KeyCode::Enter => app.submit_add(),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(c) => app.input.push(c),
        _ => {}
    }
}

fn handle_edit(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.edit = None;
            app.mode = Mode::Navigate;
        }
        KeyCode::Enter => app.submit_edit(),
        KeyCode::Backspace => {
            if let Some(edit) = app.edit.as_mut() {
                edit.buffer.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(edit) = app.edit.as_mut() {
                edit.buffer.push(c);
            }
        }
        _ => {}
    }
}
