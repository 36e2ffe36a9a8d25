use starlist_core::notify::{
  NotificationPermission,
  PermissionPrompt
};
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct PermissionBannerProps {
  pub permission: NotificationPermission,
  pub on_enable:  Callback<()>
}

#[function_component(PermissionBanner)]
pub fn permission_banner(
  props: &PermissionBannerProps
) -> Html {
  match props.permission.prompt() {
    | PermissionPrompt::Hidden => html! {},
    | PermissionPrompt::OfferOptIn => {
      let on_enable =
        props.on_enable.clone();
      html! {
        <div class="banner">
          <span>{ props.permission.as_label() }</span>
          <button class="btn" onclick={move |_| on_enable.emit(())}>
            { "Enable notifications" }
          </button>
        </div>
      }
    }
    | PermissionPrompt::Blocked => {
      html! {
        <div class="banner muted">
          { props.permission.as_label() }
        </div>
      }
    }
  }
}
