//! Server-rendered HTML pages
//!
//! The landing page drives its modal through the `/sessions` endpoints, so
//! every state transition happens server-side in `ReservationFlow`.

use crate::config::AppConfig;

const BASE_STYLE: &str = r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
            margin: 0;
            background: #0a0a0a;
            color: white;
        }
        .container {
            text-align: center;
            max-width: 720px;
            width: 100%;
            padding: 0 16px;
        }
        .muted { color: rgba(255,255,255,0.6); }
        .faint { color: rgba(255,255,255,0.4); font-size: 12px; }
        button {
            padding: 12px 24px;
            border-radius: 8px;
            border: 1px solid rgba(255,255,255,0.2);
            background: white;
            color: #0a0a0a;
            font-weight: 600;
            font-size: 15px;
            cursor: pointer;
        }
        button.secondary { background: transparent; color: white; }
        button:disabled { opacity: 0.5; cursor: not-allowed; }
"#;

/// GET / - promotional page plus the reservation modal
pub fn landing_page(config: &AppConfig) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{site}</title>
    <style>{base_style}
        .badge {{
            font-size: 12px;
            padding: 4px 10px;
            border: 1px solid rgba(255,255,255,0.2);
            border-radius: 999px;
            margin-left: 8px;
        }}
        .features {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
            gap: 16px;
            margin: 32px 0;
        }}
        .feature-card {{
            border: 1px solid rgba(255,255,255,0.1);
            border-radius: 12px;
            padding: 16px;
        }}
        .overlay {{
            position: fixed;
            inset: 0;
            background: rgba(0,0,0,0.7);
            display: none;
            justify-content: center;
            align-items: center;
        }}
        .modal {{
            background: #111;
            border: 1px solid rgba(255,255,255,0.1);
            border-radius: 16px;
            padding: 32px;
            width: 100%;
            max-width: 420px;
            text-align: left;
        }}
        .modal label {{ display: block; font-size: 14px; margin: 12px 0 6px; }}
        .modal input {{
            width: 100%;
            box-sizing: border-box;
            padding: 10px;
            border-radius: 8px;
            border: 1px solid #333;
            background: #1a1a1a;
            color: white;
        }}
        .prefix {{ color: #888; font-size: 13px; }}
        .error {{ color: #f87171; font-size: 14px; min-height: 20px; margin-top: 12px; }}
        .close {{ float: right; background: transparent; color: white; border: none; padding: 0; }}
        #secured-panel {{ display: none; text-align: center; padding: 24px 0; }}
    </style>
</head>
<body>
    <div class="container">
        <h2>{site}<span class="badge">BETA</span></h2>
        <h1>Build Your Perfect Profile</h1>
        <p class="muted">Your digital identity, your way</p>

        <div class="features">
            <div class="feature-card"><h3>Secure</h3><p class="muted">Protected username reservation</p></div>
            <div class="feature-card"><h3>Instant</h3><p class="muted">Get started in seconds</p></div>
            <div class="feature-card"><h3>Community</h3><p class="muted">Join thousands of creators</p></div>
        </div>

        <button class="secondary" id="join">Join Community</button>
        <button id="open-modal">Secure Your Username</button>
        <p class="faint">Trusted worldwide.</p>
    </div>

    <div class="overlay" id="overlay">
        <div class="modal" id="modal">
            <button class="close" id="close-modal" aria-label="Close">&times;</button>
            <h2 id="modal-title">Reserve Your Username</h2>
            <p class="muted" id="modal-description">Enter your details to secure your username</p>

            <div id="form-panel">
                <label for="username">Username <span class="prefix">{site}/</span></label>
                <input id="username" data-field="username" placeholder="yourname" autocomplete="off">
                <label for="discordHandle">Discord Username</label>
                <input id="discordHandle" data-field="discordHandle" placeholder="username#1234" autocomplete="off">
                <label for="email">Email Address</label>
                <input id="email" data-field="email" type="email" placeholder="your@email.com">
                <div class="error" id="error"></div>
                <button id="submit" style="width: 100%; margin-top: 12px;" disabled>Secure Username</button>
            </div>

            <div id="secured-panel">
                <p>You're all set! Welcome to {site}</p>
            </div>
        </div>
    </div>

    <script>
        const resetAfterMs = {reset_after_ms};
        const fields = ['username', 'discordHandle', 'email'];
        let sessionId = null;

        async function api(method, path, body) {{
            const res = await fetch(path, {{
                method,
                headers: {{ 'Content-Type': 'application/json' }},
                body: body ? JSON.stringify(body) : undefined,
            }});
            return res.json();
        }}

        function render(view) {{
            const secured = view.state.status === 'secured';
            const submitting = view.state.status === 'submitting';
            document.getElementById('overlay').style.display = view.open ? 'flex' : 'none';
            document.getElementById('form-panel').style.display = secured ? 'none' : 'block';
            document.getElementById('secured-panel').style.display = secured ? 'block' : 'none';
            document.getElementById('close-modal').style.display = secured ? 'none' : 'block';
            document.getElementById('modal-title').textContent =
                secured ? 'Username Secured!' : 'Reserve Your Username';
            document.getElementById('modal-description').textContent = secured
                ? '@' + view.state.username + ' has been successfully reserved!'
                : 'Enter your details to secure your username';
            document.getElementById('error').textContent =
                view.state.status === 'failed' ? view.state.reason : '';

            for (const field of fields) {{
                const input = document.getElementById(field);
                input.disabled = submitting;
                if (document.activeElement !== input) {{
                    input.value = view.form[field];
                }}
            }}

            const submit = document.getElementById('submit');
            submit.disabled = !view.canSubmit;
            submit.textContent = submitting ? 'Securing...' : 'Secure Username';
        }}

        async function submitForm() {{
            if (!sessionId || document.getElementById('submit').disabled) return;
            render({{ ...(await api('GET', `/sessions/${{sessionId}}`)), state: {{ status: 'submitting' }} }});
            const view = await api('POST', `/sessions/${{sessionId}}/submit`);
            render(view);
            if (view.state.status === 'secured') {{
                setTimeout(async () => render(await api('GET', `/sessions/${{sessionId}}`)), resetAfterMs + 100);
            }}
        }}

        document.getElementById('join').addEventListener('click', () => alert('Coming Soon'));

        document.getElementById('open-modal').addEventListener('click', async () => {{
            const view = sessionId
                ? await api('POST', `/sessions/${{sessionId}}/open`)
                : await api('POST', '/sessions');
            sessionId = view.id;
            render(view);
        }});

        for (const field of fields) {{
            const input = document.getElementById(field);
            input.addEventListener('input', async () => {{
                render(await api('PATCH', `/sessions/${{sessionId}}`, {{ field, value: input.value }}));
            }});
            input.addEventListener('keydown', (e) => {{ if (e.key === 'Enter') submitForm(); }});
        }}

        document.getElementById('submit').addEventListener('click', submitForm);

        async function closeModal() {{
            if (sessionId) render(await api('DELETE', `/sessions/${{sessionId}}`));
        }}
        document.getElementById('close-modal').addEventListener('click', closeModal);
        document.getElementById('overlay').addEventListener('click', closeModal);
        document.getElementById('modal').addEventListener('click', (e) => e.stopPropagation());
    </script>
</body>
</html>"#,
        site = config.site_name,
        base_style = BASE_STYLE,
        reset_after_ms = config.success_display_ms,
    )
}

/// GET /verify - placeholder where a captcha widget will go
pub fn verify_page(config: &AppConfig) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Verify - {site}</title>
    <style>{base_style}
        .widget {{
            border: 1px solid rgba(255,255,255,0.1);
            border-radius: 8px;
            padding: 32px;
            margin-bottom: 24px;
        }}
    </style>
</head>
<body>
    <div class="container" style="max-width: 420px;">
        <h1>Verify You're Human</h1>
        <p class="muted">Complete the verification below to continue</p>

        <div class="widget">
            <div class="faint">
                [hCaptcha widget will be integrated here]<br>
                Site Key: {site_key}
            </div>
        </div>

        <button id="verify" style="width: 100%;">Verify</button>
        <p class="faint">Protected by hCaptcha</p>
    </div>

    <script>
        const button = document.getElementById('verify');
        button.addEventListener('click', async () => {{
            button.disabled = true;
            const res = await fetch('/verify', {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ visitorId: localStorage.getItem('visitorId') }}),
            }});
            const outcome = await res.json();
            localStorage.setItem('visitorId', outcome.visitorId);
            button.textContent = 'Verified! Redirecting...';
            setTimeout(() => {{ window.location.href = outcome.redirectTo; }}, outcome.redirectAfterMs);
        }});
    </script>
</body>
</html>"#,
        site = config.site_name,
        base_style = BASE_STYLE,
        site_key = config.captcha_site_key,
    )
}

/// Generic error page
pub fn error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Error</title>
    <style>{base_style}</style>
</head>
<body>
    <div class="container">
        <h1>Something went wrong</h1>
        <p class="muted">{message}</p>
        <a href="/" style="color: white;">Back to the homepage</a>
    </div>
</body>
</html>"#,
        base_style = BASE_STYLE,
        message = message
    )
}
