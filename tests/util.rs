//! Shared test utilities for integration tests
//!
//! Seeded directories, scripted editors/prompters and workflow settings used
//! across the scenario files.

#![allow(dead_code)]

use std::{cell::RefCell, fs, io, path::Path, rc::Rc};

use ldapvi::{
    core::{
        diff::ChangeSummary,
        entry::{AttributeSet, Entry, Snapshot},
        ldif::{LdifOptions, ParseOptions},
        workflow::{Workflow, WorkflowSettings},
    },
    directory::{BindTarget, Scope, SearchRequest, memory::MemoryDirectory},
    interact::{
        editor::{Editor, EditorStatus},
        prompt::{Confirmation, Prompter},
    },
};

/// Attribute set from `(name, value)` pairs, in order.
pub fn attrs(pairs: &[(&str, &str)]) -> AttributeSet
{
    pairs
        .iter()
        .copied()
        .collect()
}

pub fn entry(
    dn: &str,
    pairs: &[(&str, &str)],
) -> Entry
{
    Entry::new(dn, attrs(pairs))
}

/// A small organisation: people and hosts under `o=tuna`.
pub fn tuna() -> Snapshot
{
    Snapshot::from_entries([
        entry("o=tuna", &[("objectClass", "organization"), ("o", "tuna")]),
        entry("ou=people,o=tuna", &[("objectClass", "organizationalUnit"), ("ou", "people")]),
        entry(
            "uid=alice,ou=people,o=tuna",
            &[("objectClass", "inetOrgPerson"), ("uid", "alice"), ("cn", "Alice"), ("sn", "A"), ("mail", "alice@tuna")],
        ),
        entry(
            "uid=bob,ou=people,o=tuna",
            &[("objectClass", "inetOrgPerson"), ("uid", "bob"), ("cn", "Bob"), ("sn", "B")],
        ),
        entry("ou=hosts,o=tuna", &[("objectClass", "organizationalUnit"), ("ou", "hosts")]),
    ])
}

pub fn tuna_directory() -> MemoryDirectory
{
    MemoryDirectory::with_entries(tuna())
}

pub fn settings(
    drafts: &Path,
    search: SearchRequest,
) -> WorkflowSettings
{
    WorkflowSettings {
        bind: BindTarget {
            uri: "ldap://ldap.tuna".into(),
            bind_dn: Some("cn=admin,o=tuna".into()),
            bind_pw: Some("secret".into()),
            ..Default::default()
        },
        search,
        ldif: LdifOptions::default(),
        parse: ParseOptions::default(),
        draft_dir: Some(drafts.to_path_buf()),
    }
}

/// Search for the whole subtree under `base`.
pub fn subtree(base: &str) -> SearchRequest
{
    SearchRequest::new(base, Scope::Sub)
}

/// Editor that rewrites the draft through a closure.
pub struct ScriptedEditor<F>
{
    rewrite: F,
}

impl<F: FnMut(&str) -> String> ScriptedEditor<F>
{
    pub fn new(rewrite: F) -> Self
    {
        Self { rewrite }
    }
}

impl<F: FnMut(&str) -> String> Editor for ScriptedEditor<F>
{
    fn edit(
        &mut self,
        path: &Path,
    ) -> EditorStatus
    {
        let result = fs::read_to_string(path).and_then(|text| fs::write(path, (self.rewrite)(&text)));
        match result
        {
            Ok(()) => EditorStatus::Edited,
            Err(e) => EditorStatus::Failed { editor: "scripted".into(), reason: e.to_string() },
        }
    }
}

/// Editor that always reports the same status and leaves the draft alone.
pub struct FixedEditor(pub EditorStatus);

impl Editor for FixedEditor
{
    fn edit(
        &mut self,
        _path: &Path,
    ) -> EditorStatus
    {
        self.0
            .clone()
    }
}

/// Replays answers in order and records everything it was shown.
#[derive(Clone, Default)]
pub struct ScriptedPrompter
{
    answers: Rc<RefCell<Vec<Confirmation>>>,
    pub shown: Rc<RefCell<Vec<String>>>,
}

impl ScriptedPrompter
{
    pub fn answering(answers: &[Confirmation]) -> Self
    {
        let mut answers = answers.to_vec();
        answers.reverse();
        Self { answers: Rc::new(RefCell::new(answers)), ..Default::default() }
    }

    pub fn shown(&self) -> Vec<String>
    {
        self.shown
            .borrow()
            .clone()
    }
}

impl Prompter for ScriptedPrompter
{
    fn confirm(
        &mut self,
        summary: ChangeSummary,
    ) -> io::Result<Confirmation>
    {
        self.shown
            .borrow_mut()
            .push(format!("{summary}. Confirm?"));
        Ok(self
            .answers
            .borrow_mut()
            .pop()
            .unwrap_or(Confirmation::Proceed))
    }

    fn pause(
        &mut self,
        message: &str,
    ) -> io::Result<()>
    {
        self.shown
            .borrow_mut()
            .push(message.to_string());
        Ok(())
    }
}

pub fn workflow(
    dir: &MemoryDirectory,
    settings: WorkflowSettings,
    editor: impl Editor + 'static,
    prompter: &ScriptedPrompter,
) -> Workflow
{
    Workflow::new(settings, Box::new(dir.clone()), Box::new(editor), Box::new(prompter.clone()))
}

/// Files left in the draft directory.
pub fn drafts_in(dir: &Path) -> Vec<std::path::PathBuf>
{
    fs::read_dir(dir)
        .expect("read draft dir")
        .map(|e| {
            e.expect("dir entry")
                .path()
        })
        .collect()
}
