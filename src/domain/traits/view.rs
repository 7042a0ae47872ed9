use crate::application::rendering::RenderedMessage;

/// ChatView trait - the thin UI shell driven by the login gate and the chat feed
///
/// Implementations must be callable from any task: snapshot callbacks arrive
/// whenever the store pushes an update.
pub trait ChatView: Send + Sync {
    /// Draw the account choices, marking the selected one
    fn show_accounts(&self, accounts: &[&str], selected: Option<&str>);

    /// Show an inline login error
    fn show_login_error(&self, message: &str);

    fn clear_login_error(&self);

    fn clear_password(&self);

    /// Switch from the login view to the chat view
    fn show_chat(&self, username: &str);

    /// Replace everything in the feed with `messages`
    fn render_feed(&self, messages: &[RenderedMessage]);

    /// Replace the feed with an error notice
    fn show_feed_error(&self, notice: &str);

    fn scroll_to_bottom(&self);

    fn clear_input(&self);
}
