use anyhow::anyhow;
use starlist_core::notify::{
  DueNotification,
  NotificationPermission,
  Notifier
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{
  JsCast,
  JsValue
};
use wasm_bindgen_futures::JsFuture;

/// Web Notification API.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNotifier;

impl Notifier for BrowserNotifier {
  fn permission(
    &self
  ) -> NotificationPermission {
    browser_permission()
  }

  fn show(
    &self,
    notification: &DueNotification
  ) -> anyhow::Result<()> {
    let options =
      web_sys::NotificationOptions::new();
    options.set_body(&notification.body);
    options
      .set_tag(&notification.key.to_string());

    let shown =
      web_sys::Notification::new_with_options(
        &notification.title,
        &options
      )
      .map_err(|error| {
        anyhow!(
          "notification rejected: \
           {error:?}"
        )
      })?;

    let target = shown.clone();
    let onclick =
      Closure::<dyn FnMut()>::new(
        move || {
          if let Some(window) =
            web_sys::window()
            && let Err(error) =
              window.focus()
          {
            tracing::warn!(
              error = ?error,
              "failed to focus window"
            );
          }
          target.close();
        }
      );
    shown.set_onclick(Some(
      onclick.as_ref().unchecked_ref()
    ));
    // Lives as long as the page.
    onclick.forget();

    Ok(())
  }
}

fn notification_api() -> bool {
  web_sys::window().is_some_and(|window| {
    js_sys::Reflect::has(
      window.as_ref(),
      &JsValue::from_str("Notification")
    )
    .unwrap_or(false)
  })
}

fn from_web(
  state: web_sys::NotificationPermission
) -> NotificationPermission {
  use web_sys::NotificationPermission as Web;

  match state {
    | Web::Granted => {
      NotificationPermission::Granted
    }
    | Web::Denied => {
      NotificationPermission::Denied
    }
    | Web::Default => {
      NotificationPermission::Default
    }
    | _ => NotificationPermission::Unsupported
  }
}

pub fn browser_permission()
-> NotificationPermission {
  if notification_api() {
    from_web(web_sys::Notification::permission())
  } else {
    NotificationPermission::Unsupported
  }
}

/// Prompts for permission and resolves
/// to the user's answer. Browsers only
/// show the prompt from a user gesture.
pub async fn request_permission()
-> NotificationPermission {
  if !notification_api() {
    tracing::warn!(
      "no Notification API in this browser"
    );
    return NotificationPermission::Unsupported;
  }

  let answer =
    web_sys::Notification::request_permission()
      .map(JsFuture::from);
  let answer = match answer {
    | Ok(pending) => pending.await,
    | Err(error) => Err(error)
  };

  let permission = match answer {
    | Ok(value) => {
      web_sys::NotificationPermission::from_js_value(&value)
        .map_or_else(browser_permission, from_web)
    }
    | Err(error) => {
      tracing::error!(
        error = ?error,
        "permission prompt failed"
      );
      browser_permission()
    }
  };

  tracing::info!(
    permission = ?permission,
    "permission prompt answered"
  );
  permission
}
