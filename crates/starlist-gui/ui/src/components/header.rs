use chrono::{
  DateTime,
  Utc
};
use chrono_tz::Tz;
use starlist_core::datetime::format_local_display;
use yew::{
  Html,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct HeaderProps {
  pub now:      DateTime<Utc>,
  pub timezone: Tz
}

#[function_component(Header)]
pub fn header(
  props: &HeaderProps
) -> Html {
  html! {
    <header class="header">
      <h1 class="brand">{ "Starlist" }</h1>
      <div class="clock" title={props.timezone.name()}>
        { format_local_display(props.now, props.timezone) }
      </div>
    </header>
  }
}
