use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Main,
    Login,
    Signup,
}

impl Page {
    /// Login and signup screens handle 401 responses themselves.
    pub fn is_auth_page(self) -> bool {
        matches!(self, Page::Login | Page::Signup)
    }
}

/// Where the user currently is, plus any blocking notices waiting to be shown.
///
/// Shared between the gateway (which may redirect on 401) and whichever
/// front end is driving the controllers.
#[derive(Debug)]
pub struct Location {
    page: Mutex<Page>,
    notices: Mutex<Vec<String>>,
}

impl Location {
    pub fn new(page: Page) -> Self {
        Location {
            page: Mutex::new(page),
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn current(&self) -> Page {
        *self.page.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn navigate(&self, page: Page) {
        log::debug!("Navigating to {:?}", page);
        *self.page.lock().unwrap_or_else(|e| e.into_inner()) = page;
    }

    pub fn alert(&self, message: impl Into<String>) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.into());
    }

    pub fn take_notices(&self) -> Vec<String> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(|e| e.into_inner()))
    }
}
