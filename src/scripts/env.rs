/// Sourced by the launchers shipped in `<part>/scripts` through the symlinks
/// in the bin directory. Only sets defaults; `RABBITMQ_*` variables from the
/// caller still win.
pub const TEMPLATE: &str = r#"#!/bin/sh
RABBITMQ_HOME="{{ part }}"
NODENAME=rabbit
CONFIG_FILE="{{ prefix }}/etc/rabbitmq/rabbitmq"
LOG_BASE="{{ prefix }}/var/log/rabbitmq"
MNESIA_BASE="{{ prefix }}/var/lib/rabbitmq/mnesia"
SERVER_START_ARGS={% if cookie %}"-setcookie '{{ cookie }}'"{% endif %}
CTL_ERL_ARGS={% if cookie %}"-setcookie '{{ cookie }}'"{% endif %}

PATH="{{ erlang_path }}:${PATH}"
export PATH

[ -f "{{ prefix }}/etc/rabbitmq/rabbitmq.conf" ] && . "{{ prefix }}/etc/rabbitmq/rabbitmq.conf"
"#;
