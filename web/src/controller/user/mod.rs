pub(crate) mod post_controller;
