//! External collaborators named by interface only, never implementation
//! (`spec.md` §6 "Collaborators the core calls out to"): selection, mouse,
//! and resize handling live entirely in the host. These are no-op marker
//! traits so a host that doesn't need one of them can ignore it for free,
//! generic over whatever element handle the host's DOM layer uses.

/// `SelectionManager.setup(pre)`.
pub trait SelectionManager<Host> {
    fn setup(&mut self, _content_root: &Host) {}
}

/// `MouseEventManager.setup(pre)`.
pub trait MouseEventManager<Host> {
    fn setup(&mut self, _content_root: &Host) {}
}

/// `ResizeManager.setup(pre, wrap?)`.
pub trait ResizeManager<Host> {
    fn setup(&mut self, _content_root: &Host, _wrapper: Option<&Host>) {}
}

/// `spec.md` §4.3: "re-runs dependent managers" after any render that
/// mutated the DOM. A host calls this with whichever managers it actually
/// has and the element handle(s) those managers need; instances with no
/// registered collaborator just get the no-op default.
pub fn notify_collaborators<Host>(
    content_root: &Host,
    wrapper: Option<&Host>,
    selection: Option<&mut dyn SelectionManager<Host>>,
    mouse: Option<&mut dyn MouseEventManager<Host>>,
    resize: Option<&mut dyn ResizeManager<Host>>,
) {
    if let Some(selection) = selection {
        selection.setup(content_root);
    }
    if let Some(mouse) = mouse {
        mouse.setup(content_root);
    }
    if let Some(resize) = resize {
        resize.setup(content_root, wrapper);
    }
}
