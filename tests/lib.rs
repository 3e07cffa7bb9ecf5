mod subscribe_fallback;
