pub const TEMPLATE: &str = r#"#!/bin/sh
NODENAME=rabbit
CTL_ERL_ARGS={% if cookie %}"-setcookie '{{ cookie }}'"{% endif %}

[ "x" = "x$RABBITMQ_NODENAME" ] && RABBITMQ_NODENAME=${NODENAME}
[ "x" = "x$RABBITMQ_CTL_ERL_ARGS" ] && RABBITMQ_CTL_ERL_ARGS=${CTL_ERL_ARGS}

exec "{{ erlang_path }}/erl" \
    -pa "{{ ebin }}" \
    -noinput \
    -hidden \
    ${RABBITMQ_CTL_ERL_ARGS} \
    -name rabbitmqctl$$ \
    -s rabbit_control \
    -nodename $RABBITMQ_NODENAME \
    -extra "$@"
"#;
