use colored::*;

use subscratch_core::resolver::pool::default_upstreams;

use crate::terminal::{colors, print};

pub fn resolvers() {
    let upstreams = default_upstreams();
    let names: Vec<&str> = upstreams.iter().map(|upstream| upstream.name.as_str()).collect();
    print::set_key_width(&names);

    for upstream in &upstreams {
        print::aligned_line(
            &upstream.name,
            upstream.addr.to_string().color(colors::IPV4_ADDR),
        );
    }
    print::aligned_line("local", "hosts override map (--hosts)");
}
