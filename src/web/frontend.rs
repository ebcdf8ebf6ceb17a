//! Embedded HTML/CSS/JS frontend for the mailsort dashboard.
//!
//! The entire SPA is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Email Classifier</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

.app { max-width: 960px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; }
header .subtitle { color: var(--text-muted); font-size: 13px; }

.badge {
  padding: 2px 10px;
  border-radius: 12px;
  font-size: 12px;
  border: 1px solid var(--border);
}
.badge.ok { color: var(--green); }
.badge.warn { color: var(--yellow); }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 20px;
}
.card h2 { font-size: 16px; margin-bottom: 12px; }

label { display: block; margin: 12px 0 4px; color: var(--text-muted); font-size: 13px; }
textarea, input[type=text] {
  width: 100%;
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 8px 10px;
  font-family: var(--font);
  font-size: 14px;
}
textarea { min-height: 120px; resize: vertical; }
input[type=file] { color: var(--text-muted); font-size: 13px; }

.btn {
  background: var(--surface);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 6px 14px;
  cursor: pointer;
  font-size: 13px;
}
.btn.primary { background: var(--accent); color: #0d1117; border-color: var(--accent); }
.btn.danger { color: var(--red); }
.btn:disabled { opacity: 0.5; cursor: not-allowed; }
.btn.block { width: 100%; margin-top: 16px; height: 40px; }

.form-error {
  margin-top: 12px;
  padding: 8px 12px;
  border: 1px solid var(--red);
  border-radius: 6px;
  color: var(--red);
  display: none;
}

.summary { display: grid; grid-template-columns: repeat(3, 1fr); gap: 12px; }
.summary .stat { text-align: center; }
.summary .value { font-size: 28px; font-weight: 600; }
.summary .label { color: var(--text-muted); font-size: 12px; }

.weekdays { display: flex; gap: 8px; align-items: flex-end; height: 120px; margin-top: 20px; }
.weekdays .day { flex: 1; display: flex; flex-direction: column; align-items: center; height: 100%; }
.weekdays .bars { flex: 1; width: 100%; display: flex; align-items: flex-end; gap: 2px; }
.weekdays .bar { flex: 1; border-radius: 3px 3px 0 0; min-height: 1px; }
.weekdays .bar.prod { background: var(--green); }
.weekdays .bar.unprod { background: var(--yellow); }
.weekdays .name { font-size: 11px; color: var(--text-muted); margin-top: 4px; }

.insight { margin-top: 16px; padding: 10px 12px; border-radius: 6px; background: var(--bg); }

.result { border-left: 4px solid var(--border); }
.result.success { border-left-color: var(--green); }
.result.warning { border-left-color: var(--yellow); }
.result.danger { border-left-color: var(--red); }
.result .head { display: flex; justify-content: space-between; align-items: center; }
.result .category { font-weight: 600; }
.result .original {
  margin-top: 8px;
  padding: 8px;
  background: var(--bg);
  border-radius: 6px;
  font-family: var(--mono);
  font-size: 12px;
  white-space: pre-wrap;
}
.result .suggestion { margin-top: 8px; padding: 8px; border: 1px solid var(--green); border-radius: 6px; }
.result .meta { margin-top: 8px; color: var(--text-muted); font-size: 12px; }
.link { color: var(--accent); cursor: pointer; font-size: 12px; background: none; border: none; }

.confirm { display: none; gap: 8px; align-items: center; }
.empty { color: var(--text-muted); text-align: center; padding: 24px; }
</style>
</head>
<body>
<div class="app">

  <header>
    <div>
      <h1>Email Classifier</h1>
      <div class="subtitle">Classify emails as productive or unproductive</div>
    </div>
    <span class="badge" id="health-badge">checking…</span>
  </header>

  <div class="card">
    <h2>Analyze an email</h2>
    <label for="email-file">Email file (.pdf, .txt, .eml)</label>
    <input type="file" id="email-file" accept=".pdf,.txt,.eml">
    <label for="email-text">Email text</label>
    <textarea id="email-text" placeholder="Paste the email content here"></textarea>
    <label for="extra-context">Additional context (optional)</label>
    <input type="text" id="extra-context" placeholder="e.g. sender is a key client">
    <div class="form-error" id="form-error"></div>
    <button class="btn primary block" id="btn-submit" disabled>Analyze</button>
  </div>

  <div class="card" id="stats-card" style="display:none">
    <h2>Statistics</h2>
    <div class="summary">
      <div class="stat"><div class="value" id="stat-total">0</div><div class="label">Total</div></div>
      <div class="stat"><div class="value" id="stat-prod">0</div><div class="label" id="stat-prod-label">Productive</div></div>
      <div class="stat"><div class="value" id="stat-unprod">0</div><div class="label" id="stat-unprod-label">Unproductive</div></div>
    </div>
    <div class="weekdays" id="weekdays"></div>
    <div class="insight" id="insight"></div>
  </div>

  <div class="card">
    <div class="head" style="display:flex;justify-content:space-between;align-items:center">
      <h2>History</h2>
      <div>
        <button class="btn danger" id="btn-reset">Reset history</button>
        <span class="confirm" id="reset-confirm">
          <span>Clear all history?</span>
          <button class="btn danger" id="btn-reset-yes">Confirm</button>
          <button class="btn" id="btn-reset-no">Cancel</button>
        </span>
      </div>
    </div>
    <div id="history"></div>
  </div>

</div>

<script>
// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------
let busy = false;
let expanded = {};
let historyData = null;

// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  const data = await res.json();
  return { ok: res.ok, data };
}

function esc(s) {
  if (!s) return '';
  return s.replace(/&/g,'&amp;').replace(/</g,'&lt;').replace(/>/g,'&gt;').replace(/"/g,'&quot;');
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------
const fileEl = document.getElementById('email-file');
const textEl = document.getElementById('email-text');
const contextEl = document.getElementById('extra-context');
const submitEl = document.getElementById('btn-submit');
const errorEl = document.getElementById('form-error');

function showError(msg) {
  errorEl.textContent = msg || '';
  errorEl.style.display = msg ? 'block' : 'none';
}

function updateSubmit() {
  const hasInput = fileEl.files.length > 0 || textEl.value.trim() !== '';
  submitEl.disabled = busy || !hasInput;
  submitEl.textContent = busy ? 'Analyzing…' : 'Analyze';
}

textEl.addEventListener('input', () => { showError(''); updateSubmit(); });
fileEl.addEventListener('change', () => { showError(''); updateSubmit(); });

// Read the picked file as base64, without the data URL prefix.
function readFileBase64(file) {
  return new Promise((resolve, reject) => {
    const reader = new FileReader();
    reader.onload = () => resolve(String(reader.result).split(',')[1] || '');
    reader.onerror = () => reject(reader.error);
    reader.readAsDataURL(file);
  });
}

submitEl.addEventListener('click', async () => {
  if (busy) return;
  busy = true;
  showError('');
  updateSubmit();
  try {
    const body = { email_text: textEl.value, extra_context: contextEl.value };
    const file = fileEl.files[0];
    if (file) {
      body.file = { name: file.name, content_base64: await readFileBase64(file) };
    }
    const { ok, data } = await api('POST', '/api/analyze', body);
    if (ok) {
      fileEl.value = '';
      textEl.value = '';
      contextEl.value = '';
    } else {
      showError(data.error);
    }
  } catch (e) {
    showError('Failed to analyze the email. Please try again.');
  } finally {
    busy = false;
    updateSubmit();
    refresh();
  }
});

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------
async function loadHistory() {
  const [collapsed, full] = await Promise.all([
    api('GET', '/api/history'),
    api('GET', '/api/history?expand=1'),
  ]);
  historyData = { collapsed: collapsed.data.cards, full: full.data.cards };
  renderHistory();
}

function renderHistory() {
  const el = document.getElementById('history');
  const cards = historyData.collapsed;
  if (cards.length === 0) {
    el.innerHTML = '<div class="empty">No emails analyzed yet.</div>';
    return;
  }
  el.innerHTML = cards.map((c, i) => {
    const shown = expanded[i] ? historyData.full[i] : c;
    const original = shown.original_text ? `
      <div class="original">${esc(shown.original_text.shown)}</div>
      ${shown.original_text.expandable ? `<button class="link" data-toggle="${i}">${expanded[i] ? 'Show less' : 'Show more'}</button>` : ''}
    ` : '';
    const suggestion = c.suggestion ? `
      <div class="suggestion">
        <div class="head"><strong>Suggested reply</strong>
          <button class="btn" data-copy="${i}">Copy</button></div>
        <div>${esc(c.suggestion)}</div>
      </div>` : '';
    const sender = c.sender ? `<div class="meta">${esc(c.sender)}${c.company ? ' · ' + esc(c.company) : ''}</div>` : '';
    return `
      <div class="card result ${c.tone}">
        <div class="head">
          <span class="category">${esc(c.category)}</span>
          <span class="meta">${esc(c.timestamp)}</span>
        </div>
        <div>${esc(c.reason)}</div>
        ${original}
        ${suggestion}
        ${sender}
      </div>`;
  }).join('');
}

document.getElementById('history').addEventListener('click', async e => {
  const toggle = e.target.dataset.toggle;
  if (toggle !== undefined) {
    expanded[toggle] = !expanded[toggle];
    renderHistory();
    return;
  }
  const copy = e.target.dataset.copy;
  if (copy !== undefined) {
    try {
      await navigator.clipboard.writeText(historyData.collapsed[copy].suggestion);
      e.target.textContent = 'Copied!';
      setTimeout(() => { e.target.textContent = 'Copy'; }, 2000);
    } catch (err) {
      console.error('copy failed', err);
    }
  }
});

// Reset with inline confirm/cancel
const resetBtn = document.getElementById('btn-reset');
const resetConfirm = document.getElementById('reset-confirm');
function showConfirm(show) {
  resetBtn.style.display = show ? 'none' : 'inline-block';
  resetConfirm.style.display = show ? 'inline-flex' : 'none';
}
resetBtn.addEventListener('click', () => showConfirm(true));
document.getElementById('btn-reset-no').addEventListener('click', () => showConfirm(false));
document.getElementById('btn-reset-yes').addEventListener('click', async () => {
  await api('DELETE', '/api/history');
  expanded = {};
  showConfirm(false);
  refresh();
});

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------
async function loadStats() {
  const { data } = await api('GET', '/api/stats');
  const s = data.summary;
  document.getElementById('stats-card').style.display = s.total === 0 ? 'none' : 'block';
  document.getElementById('stat-total').textContent = s.total;
  document.getElementById('stat-prod').textContent = s.productive;
  document.getElementById('stat-unprod').textContent = s.unproductive;
  document.getElementById('stat-prod-label').textContent = `Productive (${s.productive_pct}%)`;
  document.getElementById('stat-unprod-label').textContent = `Unproductive (${s.unproductive_pct}%)`;

  const max = Math.max(1, ...data.weekdays.map(d => Math.max(d.productive, d.unproductive)));
  document.getElementById('weekdays').innerHTML = data.weekdays.map(d => `
    <div class="day">
      <div class="bars">
        <div class="bar prod" style="height:${(d.productive / max) * 100}%" title="${d.productive} productive"></div>
        <div class="bar unprod" style="height:${(d.unproductive / max) * 100}%" title="${d.unproductive} unproductive"></div>
      </div>
      <div class="name">${d.day}</div>
    </div>`).join('');
  document.getElementById('insight').textContent = data.insight_message;
}

// ---------------------------------------------------------------------------
// Health badge
// ---------------------------------------------------------------------------
async function loadHealth() {
  try {
    const { data } = await api('GET', '/api/health');
    const el = document.getElementById('health-badge');
    el.textContent = data.service_available ? '● service online' : '○ service offline';
    el.className = 'badge ' + (data.service_available ? 'ok' : 'warn');
  } catch (e) {
    // Silently ignore health badge errors
  }
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------
function refresh() {
  loadHistory();
  loadStats();
}

loadHealth();
refresh();
updateSubmit();
</script>
</body>
</html>"##;
