use std::fmt;

use git2::{Cred, CredentialType, RemoteCallbacks};

/// Basic-auth credentials for the comment remote.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    /// Callbacks answering credential prompts for fetch, clone and push.
    ///
    /// Plaintext credentials are offered once; libgit2 re-invokes the callback
    /// after a rejected attempt, so a second prompt fails instead of looping.
    pub(crate) fn remote_callbacks(&self) -> RemoteCallbacks<'_> {
        let mut offered = false;
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, allowed: CredentialType| {
            if allowed.is_user_pass_plaintext()
                && let Some(user) = self.username.as_deref()
            {
                if offered {
                    return Err(git2::Error::from_str("remote rejected credentials"));
                }
                offered = true;
                return Cred::userpass_plaintext(user, self.password.as_deref().unwrap_or(""));
            }
            if allowed.is_ssh_key()
                && let Some(user) = username_from_url
            {
                return Cred::ssh_key_from_agent(user);
            }
            Cred::default()
        });
        callbacks
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
